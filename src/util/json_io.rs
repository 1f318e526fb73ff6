
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Returns true if the path ends with a `.gz` extension
fn is_gzipped(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

/// Opens a file for reading, transparently decompressing `.gz` files.
/// # Arguments
/// * `filename` - the file path to open
/// # Errors
/// * if the file does not open properly
pub fn open_reader(filename: &Path) -> anyhow::Result<Box<dyn Read>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn Read> = if is_gzipped(filename) {
        Box::new(flate2::read::MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Loads a JSON file (optionally gzipped) into some deserializable type.
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let reader = open_reader(filename)?;
    serde_json::from_reader(reader)
        .with_context(|| format!("Error while deserializing {filename:?}:"))
}

/// Saves a serializable value as pretty JSON, gzipped if the path ends with `.gz`.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let inner: Box<dyn Write> = if is_gzipped(out_filename) {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    let mut writer = BufWriter::new(inner);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_gz_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut data: BTreeMap<String, u64> = Default::default();
        data.insert("geneA".to_string(), 10);
        data.insert("geneB".to_string(), 20);

        for name in ["plain.json", "packed.json.gz"] {
            let path = tmp.path().join(name);
            save_json(&data, &path).unwrap();
            let loaded: BTreeMap<String, u64> = load_json(&path).unwrap();
            assert_eq!(loaded, data);
        }

        // the gzipped one really is compressed
        let raw = std::fs::read(tmp.path().join("packed.json.gz")).unwrap();
        assert_eq!(&raw[0..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let result: anyhow::Result<BTreeMap<String, u64>> = load_json(&tmp.path().join("nope.json"));
        assert!(result.is_err());
    }
}
