use dailies_core::Storage;

use crate::app::AppContext;
use crate::errors::CliError;

pub fn handle_check(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let (storage, _owner) = ctx.open_storage()?;
    match storage.check_integrity() {
        Ok(()) => {
            if !ctx.quiet() {
                println!("Integrity check: OK");
                println!("- sqlite pages: OK");
                println!("- foreign keys: OK");
                println!("- metadata keys: OK");
                println!("- event details: OK");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("Integrity check: FAILED");
            eprintln!("- error: {}", err);
            Err(CliError::integrity_failed("Integrity check failed").into())
        }
    }
}
