//! Dump all records in an IFF file
use std::env;
use std::fs::File;
use std::io::BufReader;

use wcp_iff::{IffReader, RawRecord};

fn dump_records(path: &str) -> wcp_iff::Result<()> {
    let mut reader = IffReader::new(BufReader::new(File::open(path)?));
    // End offsets of the forms enclosing the cursor.
    let mut open_forms: Vec<u64> = Vec::new();

    while let Some(record) = reader.read_header()? {
        while open_forms.last().is_some_and(|&end| record.offset() >= end) {
            open_forms.pop();
        }
        let indent = "  ".repeat(open_forms.len());
        match &record {
            RawRecord::Form(header) => {
                println!("{}[{}] FORM '{}' length={}", indent, header.offset, header.tag, header.length);
                open_forms.push(header.end());
            },
            RawRecord::Chunk(chunk) => {
                println!("{}[{}] '{}' length={}", indent, chunk.offset, chunk.tag, chunk.length);
            },
        }
        if open_forms.is_empty() {
            break;
        }
    }

    let trailing = std::fs::metadata(path)?.len().saturating_sub(reader.offset());
    if trailing > 0 {
        println!("{trailing} trailing bytes (comment)");
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <iff-file>", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    println!("Records in {}:", path);
    if let Err(err) = dump_records(path) {
        eprintln!("{path}: {err}");
        std::process::exit(1);
    }
}
