use anyhow::Result;
use clap::Parser;
use sitepack::lock::LockDocument;

#[derive(Parser, Debug)]
pub struct SchemaCommand;

impl SchemaCommand {
    pub fn execute(self) -> Result<()> {
        let schema = schemars::schema_for!(LockDocument);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
