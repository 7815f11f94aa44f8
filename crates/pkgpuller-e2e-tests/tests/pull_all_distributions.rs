use pkgpuller_e2e_tests::{
    FakePackage, TestDistribution, apt_line, apt_packages_index, build_pull_params, gzip,
    init_tracing, list_files, rpm_baseurl, rpm_repomd_xml, serve_apt_repository, serve_file,
    serve_missing, serve_rpm_repository, setup_test_environment,
};
use pkgpuller_lib::cli::run_pull;
use pkgpuller_lib::driver::pull_all;
use pkgpuller_lib::error::PullError;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const AMD_DRIVER: &str = "Advanced Micro Devices (AMD) <gpudriverdevsupport@amd.com>";

#[tokio::test]
async fn test_unreachable_distribution_is_skipped() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let deb = vec![FakePackage::new(
        "amdgpu-dkms",
        "pool/main/a/amdgpu-dkms_1.0_amd64.deb",
        AMD_DRIVER,
    )];
    let rpm = vec![
        FakePackage::new("amdgpu-dkms", "Packages/a/amdgpu-dkms-1.0.rpm", AMD_DRIVER)
            .with_epoch("1"),
    ];
    let mut mocks = serve_apt_repository(&mut server, "/ubuntu", &deb).await.unwrap();
    mocks.extend(serve_rpm_repository(&mut server, "/el/9", &rpm).await.unwrap());
    mocks.extend(serve_missing(&mut server, "/el/10/repodata/repomd.xml").await);

    let env = setup_test_environment(
        &["amdgpu-dkms"],
        &[
            TestDistribution::new("ub24", &[apt_line(&server.url(), "/ubuntu")]),
            TestDistribution::new("el10", &[rpm_baseurl(&server.url(), "/el/10")]),
            TestDistribution::new("el9", &[rpm_baseurl(&server.url(), "/el/9")]),
        ],
    )
    .unwrap();

    let params = build_pull_params(&env, &[], false, false).unwrap();
    let distributions = params.distributions.clone();
    let summary = pull_all(&distributions, Arc::new(params.settings.clone())).await;

    assert_eq!(summary.succeeded(), vec!["ub24", "el9"]);
    assert_eq!(summary.skipped(), vec!["el10"]);
    assert!(summary.failed().is_empty());
    assert_eq!(summary.tally().amdgpu, 2);

    run_pull(params)
        .await
        .expect("Skipped distributions must not fail the run");

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.summary_path()).unwrap()).unwrap();
    let statuses: Vec<_> = summary["distributions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| (d["tag"].as_str().unwrap().to_string(), d["outcome"]["status"].clone()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("ub24".to_string(), serde_json::json!("success")),
            ("el10".to_string(), serde_json::json!("skipped")),
            ("el9".to_string(), serde_json::json!("success")),
        ]
    );
    assert!(!env.distro_dir("el10").exists());
}

#[tokio::test]
async fn test_one_missing_repository_does_not_skip_distribution() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let packages = vec![FakePackage::new(
        "amdgpu-dkms",
        "pool/main/a/amdgpu-dkms_1.0_amd64.deb",
        AMD_DRIVER,
    )];
    let mut mocks = serve_missing(
        &mut server,
        "/rocm/dists/noble/main/binary-amd64/Packages.gz",
    )
    .await;
    mocks.extend(serve_apt_repository(&mut server, "/ubuntu", &packages).await.unwrap());

    let env = setup_test_environment(
        &["amdgpu-dkms"],
        &[TestDistribution::new(
            "ub24",
            &[
                apt_line(&server.url(), "/rocm"),
                apt_line(&server.url(), "/ubuntu"),
            ],
        )],
    )
    .unwrap();

    let params = build_pull_params(&env, &["ub24"], false, false).unwrap();
    let summary = pull_all(&params.distributions, Arc::new(params.settings.clone())).await;
    assert_eq!(summary.succeeded(), vec!["ub24"]);
    assert!(summary.skipped().is_empty());
    assert!(summary.failed().is_empty());
    assert_eq!(
        list_files(&env.distro_dir("ub24")).unwrap(),
        vec!["amdgpu-dkms_1.0_amd64.deb"]
    );
}

#[tokio::test]
async fn test_parallel_pull_reports_in_configuration_order() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let deb = vec![FakePackage::new(
        "amdgpu-dkms",
        "pool/main/a/amdgpu-dkms_1.0_amd64.deb",
        AMD_DRIVER,
    )];
    let rpm = vec![
        FakePackage::new("amdgpu-dkms", "Packages/a/amdgpu-dkms-1.0.rpm", AMD_DRIVER)
            .with_epoch("1"),
    ];

    // The first distribution's index is slow, so it finishes last.
    let slow_index = gzip(apt_packages_index(&deb).as_bytes()).unwrap();
    let mut mocks = vec![
        server
            .mock("GET", "/slow/dists/noble/main/binary-amd64/Packages.gz")
            .with_status(200)
            .with_chunked_body(move |w| {
                std::thread::sleep(Duration::from_millis(300));
                w.write_all(&slow_index)
            })
            .create_async()
            .await,
    ];
    for package in &deb {
        mocks.extend(
            serve_file(
                &mut server,
                &format!("/slow/{}", package.location),
                package.content.clone(),
            )
            .await,
        );
    }
    mocks.extend(serve_rpm_repository(&mut server, "/el/9", &rpm).await.unwrap());
    mocks.extend(serve_apt_repository(&mut server, "/ubuntu", &deb).await.unwrap());
    mocks.extend(serve_missing(&mut server, "/el/10/repodata/repomd.xml").await);

    let env = setup_test_environment(
        &["amdgpu-dkms"],
        &[
            TestDistribution::new("ub22", &[apt_line(&server.url(), "/slow")]),
            TestDistribution::new("el9", &[rpm_baseurl(&server.url(), "/el/9")]),
            TestDistribution::new("ub24", &[apt_line(&server.url(), "/ubuntu")]),
            TestDistribution::new("el10", &[rpm_baseurl(&server.url(), "/el/10")]),
        ],
    )
    .unwrap();

    let mut params = build_pull_params(&env, &[], false, false).unwrap();
    params.settings.network.distro_parallelism = 4;
    let summary = pull_all(&params.distributions, Arc::new(params.settings.clone())).await;

    let tags: Vec<_> = summary
        .distributions
        .iter()
        .map(|d| d.tag.as_str())
        .collect();
    assert_eq!(tags, vec!["ub22", "el9", "ub24", "el10"]);
    assert_eq!(summary.succeeded(), vec!["ub22", "el9", "ub24"]);
    assert_eq!(summary.skipped(), vec!["el10"]);
    assert_eq!(summary.tally().amdgpu, 3);
}

/// Pulls a single distribution whose index is broken and checks that it fails the run
/// without leaving index documents in its output directory.
async fn assert_broken_index_fails(tag: &str, repository: String) {
    let env = setup_test_environment(
        &["amdgpu-dkms"],
        &[TestDistribution::new(tag, &[repository])],
    )
    .unwrap();

    let params = build_pull_params(&env, &[tag], false, false).unwrap();
    let summary = pull_all(&params.distributions, Arc::new(params.settings.clone())).await;
    assert_eq!(summary.failed(), vec![tag]);
    assert!(summary.succeeded().is_empty());
    assert!(summary.skipped().is_empty());

    match run_pull(params).await {
        Err(PullError::DistributionsFailed { count, tags }) => {
            assert_eq!(count, 1);
            assert_eq!(tags, tag);
        }
        other => panic!("A broken index must fail the run: {other:?}"),
    }

    let distro_dir = env.distro_dir(tag);
    for scratch in ["Packages", "repomd.xml", "primary.xml"] {
        assert!(
            !distro_dir.join(scratch).exists(),
            "{scratch} left behind in {}",
            distro_dir.display()
        );
    }
    if distro_dir.exists() {
        assert!(list_files(&distro_dir).unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_malformed_repomd_fails_distribution() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let _mocks = serve_file(
        &mut server,
        "/el/9/repodata/repomd.xml",
        b"<?xml version=\"1.0\"?>\n<repomd><revision>1</data></repomd>\n".to_vec(),
    )
    .await;

    assert_broken_index_fails("el9", rpm_baseurl(&server.url(), "/el/9")).await;
}

#[tokio::test]
async fn test_repomd_without_primary_fails_distribution() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let repomd = rpm_repomd_xml("repodata/0123-filelists.xml.gz")
        .replace("type=\"primary\"", "type=\"filelists\"");
    let _mocks = serve_file(&mut server, "/el/9/repodata/repomd.xml", repomd.into_bytes()).await;

    assert_broken_index_fails("el9", rpm_baseurl(&server.url(), "/el/9")).await;
}

#[tokio::test]
async fn test_missing_primary_fails_distribution() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let mut mocks = serve_file(
        &mut server,
        "/el/9/repodata/repomd.xml",
        rpm_repomd_xml("repodata/0123-primary.xml.gz").into_bytes(),
    )
    .await;
    mocks.extend(serve_missing(&mut server, "/el/9/repodata/0123-primary.xml.gz").await);

    assert_broken_index_fails("el9", rpm_baseurl(&server.url(), "/el/9")).await;
}

#[tokio::test]
async fn test_corrupt_primary_gzip_fails_distribution() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let mut mocks = serve_file(
        &mut server,
        "/el/9/repodata/repomd.xml",
        rpm_repomd_xml("repodata/0123-primary.xml.gz").into_bytes(),
    )
    .await;
    mocks.extend(
        serve_file(
            &mut server,
            "/el/9/repodata/0123-primary.xml.gz",
            b"<metadata packages=\"0\"/>".to_vec(),
        )
        .await,
    );

    assert_broken_index_fails("el9", rpm_baseurl(&server.url(), "/el/9")).await;
}

#[tokio::test]
async fn test_corrupt_packages_gzip_fails_distribution() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let _mocks = serve_file(
        &mut server,
        "/ubuntu/dists/noble/main/binary-amd64/Packages.gz",
        b"Package: amdgpu-dkms\n".to_vec(),
    )
    .await;

    assert_broken_index_fails("ub24", apt_line(&server.url(), "/ubuntu")).await;
}

#[tokio::test]
async fn test_repeated_pull_is_idempotent() {
    init_tracing();

    let mut server = mockito::Server::new_async().await;
    let packages = vec![
        FakePackage::new(
            "amdgpu-dkms",
            "pool/main/a/amdgpu-dkms_1.0_amd64.deb",
            AMD_DRIVER,
        ),
        FakePackage::new(
            "amdgpu-dkms-firmware",
            "pool/main/a/amdgpu-dkms-firmware_1.0_all.deb",
            AMD_DRIVER,
        ),
    ];
    let _mocks = serve_apt_repository(&mut server, "/ubuntu", &packages)
        .await
        .unwrap();

    let env = setup_test_environment(
        &["amdgpu-dkms", "amdgpu-dkms-firmware", "amdgpu-dkms"],
        &[TestDistribution::new("ub22", &[apt_line(&server.url(), "/ubuntu")])],
    )
    .unwrap();

    run_pull(build_pull_params(&env, &["ub22"], true, false).unwrap())
        .await
        .expect("First pull should succeed");
    let first = list_files(&env.distro_dir("ub22")).unwrap();
    let first_dump = list_files(&env.distro_dir("ub22").join("packages-amdgpu")).unwrap();

    run_pull(build_pull_params(&env, &["ub22"], true, false).unwrap())
        .await
        .expect("Second pull should succeed");
    let second = list_files(&env.distro_dir("ub22")).unwrap();
    let second_dump = list_files(&env.distro_dir("ub22").join("packages-amdgpu")).unwrap();

    assert_eq!(
        first,
        vec![
            "amdgpu-dkms-firmware_1.0_all.deb",
            "amdgpu-dkms_1.0_amd64.deb"
        ]
    );
    assert_eq!(first, second);
    assert_eq!(first_dump, second_dump);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.summary_path()).unwrap()).unwrap();
    assert_eq!(summary["distributions"].as_array().unwrap().len(), 1);
}
