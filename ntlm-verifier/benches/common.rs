use std::io::Write;

use ntlm_verifier::NtlmHash;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates `count` random hashes with a fixed seed for reproducible results.
pub fn generate_hashes(seed: u64, count: usize) -> Vec<NtlmHash> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| NtlmHash::from_digest(&rng.r#gen::<[u8; 16]>())).collect()
}

/// Writes a sorted dataset in the published layout: `HASH:FREQ\r\n` with
/// frequencies skewed towards small numbers.
pub fn write_dataset(hashes: &[NtlmHash]) -> tempfile::NamedTempFile {
    let mut sorted = hashes.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut rng = StdRng::seed_from_u64(7);
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    {
        let mut out = std::io::BufWriter::new(file.as_file_mut());
        for hash in &sorted {
            let freq: u32 = 1 << rng.gen_range(0..24);
            write!(out, "{hash}:{freq}\r\n").expect("Failed to write dataset");
        }
        out.flush().expect("Failed to flush dataset");
    }
    file
}
