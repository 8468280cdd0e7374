pub mod delegation;
pub mod dsync;
pub mod keystore;
pub mod serve;
pub mod sig0;
pub mod truststore;

use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
