//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `photoshelf_core` linkage without a UI host.
//! - Optionally open a library root and print its album order.
//!
//! Usage: `photoshelf_cli [LIBRARY_ROOT]`

use std::process::ExitCode;

fn main() -> ExitCode {
    println!("photoshelf_core ping={}", photoshelf_core::ping());
    println!("photoshelf_core version={}", photoshelf_core::core_version());

    let Some(root) = std::env::args_os().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let library = match photoshelf_core::open_library_at(&root) {
        Ok(library) => library,
        Err(err) => {
            eprintln!("open failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match library.list_albums() {
        Ok(albums) => {
            for entry in albums {
                println!(
                    "{} {} photos={}",
                    entry.album.position,
                    entry.album.id,
                    entry.photos.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("list failed: {err}");
            ExitCode::FAILURE
        }
    }
}
