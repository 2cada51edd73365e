//! `parley normalize`: run the markdown normalizer over a file or stdin.

use std::error::Error;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use crate::core::normalize::{normalize, NormalizationStrategy};

pub fn normalize_reader<R: Read>(mut reader: R, strategy: NormalizationStrategy) -> io::Result<String> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(normalize(&input, strategy))
}

pub fn run_normalize(file: Option<PathBuf>, strategy: NormalizationStrategy) -> Result<(), Box<dyn Error>> {
    let output = match file {
        Some(path) => normalize_reader(File::open(path)?, strategy)?,
        None => normalize_reader(io::stdin().lock(), strategy)?,
    };
    println!("{output}");
    Ok(())
}
