use schemars::schema_for;
use sitepack_lock::LockDocument;

fn main() {
    let schema = schema_for!(LockDocument);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to render schema: {e}"),
    }
}
