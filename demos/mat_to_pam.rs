//! Decode a MAT texture and write it as a PAM (RGB_ALPHA) image
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

fn convert(input: &str, output: &str) -> wcp_iff::Result<()> {
    let image = wcp_iff::read_mat_file(input)?;
    eprintln!(
        "{}x{} palette: {:?}",
        image.width(),
        image.height(),
        image.palette_origin()
    );

    let mut out = BufWriter::new(File::create(output)?);
    write!(
        out,
        "P7\nWIDTH {}\nHEIGHT {}\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n",
        image.width(),
        image.height()
    )?;
    out.write_all(image.pixels())?;
    out.flush()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <in.mat> <out.pam>", args[0]);
        std::process::exit(1);
    }

    if let Err(err) = convert(&args[1], &args[2]) {
        eprintln!("{}: {err}", args[1]);
        std::process::exit(1);
    }
}
