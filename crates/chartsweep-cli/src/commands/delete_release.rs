//! Delete-release command - remove releases of charts changed on this branch

use crate::commands::{ChangedArgs, GlobalArgs, parse_slug, run_delete_changed};
use crate::error::Result;

pub async fn run(global: &GlobalArgs, repository: &str, args: &ChangedArgs) -> Result<()> {
    let slug = parse_slug(repository)?;
    run_delete_changed(global, slug, args).await
}
