use matfile_handler::{Array, MatFileReader, ReadOptions};
use std::env;
use std::fs::File;
use std::io::BufReader;

fn describe(value: &Array) -> String {
    let dims = value
        .dimensions()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("x");
    match value {
        Array::Empty => "[]".to_string(),
        Array::Char(c) => format!("{} char '{}'", dims, c.as_str()),
        Array::Struct(s) => format!("{} struct with fields {:?}", dims, s.field_names()),
        Array::Object(o) => format!("{} object of class {}", dims, o.class_name()),
        other => format!("{} {}", dims, other.kind()),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-mat-file> [--strict]", args[0]);
        std::process::exit(1);
    }

    let mat_path = &args[1];
    let strict = args.iter().skip(2).any(|arg| arg == "--strict");
    let options = ReadOptions::default().verify_checksums(strict);

    println!("Reading MAT-file: {}", mat_path);
    if strict {
        println!("Verifying compressed element checksums.");
    }
    println!("{}", "=".repeat(60));

    let file = match File::open(mat_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("ERROR: Failed to open {}", mat_path);
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    match MatFileReader::with_options(BufReader::new(file), options).read() {
        Ok(mat_file) => {
            println!("Description: {}", mat_file.description());
            println!("Variables: {}", mat_file.len());
            for (i, variable) in mat_file.iter().enumerate() {
                println!(
                    "  {}. {}{}: {}",
                    i + 1,
                    variable.name,
                    if variable.is_global { " (global)" } else { "" },
                    describe(&variable.value)
                );
            }
        }
        Err(e) => {
            eprintln!("\nERROR: Failed to read MAT-file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
