use super::Result;
use nepal_election::config::Settings;
use nepal_election::database::ingestion::{DatasetLoader, LoadSummary};
use nepal_election::database::ElectionDatabase;

/// Load every raw dataset into the database at `settings.database_path`.
pub async fn load(settings: &Settings, force: bool) -> Result<LoadSummary> {
    let db = ElectionDatabase::open(&settings.database_path).await?;
    let mut loader = DatasetLoader::new(db);
    Ok(loader.load_dir(&settings.data_dir, force).await?)
}
