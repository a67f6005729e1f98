//! Example usage of the ergonomic-winsys library.

use ergonomic_winsys::prelude::*;
use tracing_subscriber::EnvFilter;

#[cfg(windows)]
fn main() -> Result<()> {
    init_tracing();

    println!("Ergonomic Windows System Demo\n");

    println!("=== Uptime ===");
    let up = uptime();
    println!(
        "Up for {}h {}m {}s",
        up.as_secs() / 3600,
        up.as_secs() / 60 % 60,
        up.as_secs() % 60
    );
    println!();

    println!("=== Version Resource ===");
    let path = std::env::args().nth(1).unwrap_or_else(|| {
        let root = std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".into());
        format!(r"{root}\System32\kernel32.dll")
    });
    println!("File: {}", path);
    match file_version_info(&path) {
        Ok(data) => {
            let fixed = data.fixed_file_info()?;
            println!("File version: {}", fixed.file_version());
            println!("Product version: {}", fixed.product_version());
            println!("Flags: {:?}", fixed.flags());

            for translation in data.translations().unwrap_or_default() {
                println!(
                    "String table {:04x}{:04x}:",
                    translation.language, translation.code_page
                );
                for key in ["CompanyName", "FileDescription", "ProductName", "ProductVersion"] {
                    match data.query_value_for(key, translation) {
                        Ok(value) => println!("  {key}: {value}"),
                        Err(e) => println!("  {key}: <{e}>"),
                    }
                }
            }
        }
        Err(e) => println!("No version information: {}", e),
    }
    println!();

    println!("=== Process Info ===");
    let info = basic_information(current_process())?;
    println!("Process ID: {}", info.unique_process_id);
    println!("Parent process ID: {}", info.inherited_from_process_id());
    println!("PEB base address: {:#x}", info.peb_base_address);
    match image_file_name(current_process()) {
        Ok(name) => println!("Image: {}", name),
        Err(e) => println!("Image: <{}>", e),
    }

    println!("\nDemo complete!");
    Ok(())
}

#[cfg(not(windows))]
fn main() -> Result<()> {
    init_tracing();
    println!("ergonomic-winsys only queries the OS on Windows.");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
