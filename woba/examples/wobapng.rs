//! This example shows you how to convert a WOBA record into PNG files, one
//! for the image plane and one for the mask plane.

#![allow(missing_docs)]

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 4 {
        eprintln!("Usage: {} <input.bmap> <image.png> <mask.png>", args[0]);

        return ExitCode::FAILURE;
    }

    let input_path = &args[1];

    let data = match std::fs::read(input_path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Failed to read input file: {err}");

            return ExitCode::FAILURE;
        }
    };

    let surface = match woba::decode(&data) {
        Ok(surface) => surface,
        Err(err) => {
            eprintln!("Failed to decode WOBA: {err}");

            return ExitCode::FAILURE;
        }
    };

    println!("Decoded: {}x{} image", surface.width(), surface.height());

    for (plane, path) in [(surface.image(), &args[2]), (surface.mask(), &args[3])] {
        if let Err(err) = plane.to_gray_image().save(path) {
            eprintln!("Failed to save PNG: {err}");

            return ExitCode::FAILURE;
        }

        eprintln!("Saved: {path}");
    }

    ExitCode::SUCCESS
}
