use crate::classify::{ClassificationTally, classify_package_file};
use crate::cli::ClassifyParams;
use crate::error::PullError;

pub async fn run_classify(params: ClassifyParams) -> Result<(), PullError> {
    let ClassifyParams {
        files,
        family,
        index,
        classifier,
        dump,
    } = params;

    tracing::info!("Classifying {} {} packages", files.len(), family);

    let mut tally = ClassificationTally::default();
    for file in &files {
        let entry = index.as_ref().and_then(|index| {
            let file_name = file.file_name()?.to_str()?;
            index
                .entries
                .iter()
                .find(|entry| entry.file_name() == file_name)
        });
        let classification =
            classify_package_file(file, family, entry, &classifier, dump, &mut tally).await?;
        println!(
            "{}\t{}\t{}",
            file.display(),
            classification.ownership,
            classification.rule
        );
    }

    println!(
        "Packages: {} total, {} AMD ({} amdgpu), {} third-party",
        tally.total, tally.amd, tally.amdgpu, tally.other
    );
    Ok(())
}
