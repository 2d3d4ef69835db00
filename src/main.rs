//! cartpak CLI
//! Usage:
//!   cartpak compress   <input> <output> [legacy|pxa]
//!   cartpak decompress <input> <output>

use std::{env, fs, process};

use cartpak::Format;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 4 || args.len() > 5 {
        eprintln!("Usage:");
        eprintln!("  cartpak compress   <input> <output> [legacy|pxa]");
        eprintln!("  cartpak decompress <input> <output>");
        process::exit(1);
    }

    let command     = &args[1];
    let input_path  = &args[2];
    let output_path = &args[3];

    let input = fs::read(input_path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", input_path, e);
        process::exit(1);
    });

    let output = match command.as_str() {
        "compress" => {
            if input.len() > cartpak::CODE_MAX {
                eprintln!(
                    "Input is {} bytes; the code section caps at {}",
                    input.len(),
                    cartpak::CODE_MAX
                );
                process::exit(1);
            }
            let format = match args.get(4).map(String::as_str) {
                Some("legacy") => Format::Legacy,
                Some("pxa") | None => Format::Pxa,
                Some(other) => {
                    eprintln!("Unknown format: {}", other);
                    process::exit(1);
                }
            };
            cartpak::compress(&input, format)
        }
        "decompress" => cartpak::decompress(&input).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        _ => {
            eprintln!("Unknown command: {}", command);
            process::exit(1);
        }
    };

    fs::write(output_path, &output).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", output_path, e);
        process::exit(1);
    });
    println!("Done. {} bytes → {} bytes", input.len(), output.len());
}
