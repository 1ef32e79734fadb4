//! Forces the output of a process into a given encoding.
//!
//! Input is read as UTF-8 with invalid sequences dropped. Each chunk is then
//! encoded into the target encoding with `?` for unmappable characters, and
//! the resulting bytes are written back as UTF-8 text, replacing whatever
//! does not form valid UTF-8.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use encoding_rs::EncoderResult;

use crate::{ToolError, ToolResult};

const CHUNK: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
    /// Any other single or multi byte encoding known by its WHATWG label.
    Other(&'static encoding_rs::Encoding),
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        match name.as_str() {
            "utf8" | "utf-8" => return Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => return Ok(Encoding::Ascii),
            _ => {}
        }
        let found = [name.clone(), name.replace('-', "")]
            .iter()
            .find_map(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
            .ok_or_else(|| format!("unsupported encoding '{s}'"))?;
        if found == encoding_rs::UTF_8 {
            Ok(Encoding::Utf8)
        } else if found.output_encoding() != found {
            // utf-16 and friends can only be decoded
            Err(format!("cannot encode to '{s}'"))
        } else {
            Ok(Encoding::Other(found))
        }
    }
}

impl Encoding {
    fn push(self, text: &str, out: &mut String) {
        match self {
            Encoding::Utf8 => out.push_str(text),
            Encoding::Ascii => out.extend(text.chars().map(|c| if c.is_ascii() { c } else { '?' })),
            Encoding::Other(encoding) => {
                let bytes = encode_lossy(encoding, text);
                out.push_str(&String::from_utf8_lossy(&bytes));
            }
        }
    }
}

/// Encodes `text`, substituting `?` for every unmappable character.
fn encode_lossy(encoding: &'static encoding_rs::Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut bytes = Vec::with_capacity(text.len());
    let mut rest = text;
    loop {
        if let Some(needed) = encoder.max_buffer_length_from_utf8_without_replacement(rest.len()) {
            bytes.reserve(needed);
        }
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut bytes, true);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => bytes.push(b'?'),
        }
    }
    bytes
}

#[derive(Parser, Debug)]
#[command(name = "recode")]
#[command(about = "Helper to enforce a given encoding on the output of a process", long_about = None)]
pub struct RecodeArgs {
    /// Select the output encoding
    #[arg(long = "encoding", default_value = "utf8")]
    pub encoding: Encoding,
}

/// Incremental UTF-8 decoder that drops invalid bytes and carries incomplete
/// sequences over to the next chunk.
#[derive(Debug, Default)]
pub struct LossyDecoder {
    pending: Vec<u8>,
}

impl LossyDecoder {
    pub fn feed(&mut self, bytes: &[u8], encoding: Encoding, out: &mut String) {
        self.pending.extend_from_slice(bytes);
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    encoding.push(text, out);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // valid_up_to guarantees this prefix decodes
                    encoding.push(std::str::from_utf8(valid).unwrap_or_default(), out);
                    match err.error_len() {
                        Some(len) => rest = &after[len..],
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = rest.to_vec();
    }
}

pub fn recode<R: Read, W: Write>(encoding: Encoding, mut input: R, mut output: W) -> ToolResult<()> {
    let stdin_err = |err| ToolError::FileError(err, PathBuf::from("<stdin>"));
    let stdout_err = |err| ToolError::FileError(err, PathBuf::from("<stdout>"));

    let mut decoder = LossyDecoder::default();
    let mut buf = [0u8; CHUNK];
    let mut text = String::with_capacity(CHUNK);
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(stdin_err(err)),
        };
        text.clear();
        decoder.feed(&buf[..n], encoding, &mut text);
        output.write_all(text.as_bytes()).map_err(stdout_err)?;
    }
    output.flush().map_err(stdout_err)
}

pub fn run(args: &RecodeArgs) -> ToolResult<()> {
    recode(args.encoding, std::io::stdin().lock(), std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn recoded(encoding: Encoding, input: &[u8]) -> String {
        let mut out = Vec::new();
        recode(encoding, input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_utf8_drops_invalid_bytes() {
        assert_eq!(recoded(Encoding::Utf8, b"ok \xff\xfe m\xc3\xa4h"), "ok  mäh");
    }

    #[test]
    fn test_ascii_replaces_non_ascii() {
        assert_eq!(recoded(Encoding::Ascii, "Grüße 🙂\n".as_bytes()), "Gr??e ?\n");
    }

    #[test]
    fn test_split_sequences_survive_chunking() {
        let mut decoder = LossyDecoder::default();
        let mut out = String::new();
        let bytes = "ä".as_bytes();
        decoder.feed(&bytes[..1], Encoding::Utf8, &mut out);
        assert_eq!(out, "");
        decoder.feed(&bytes[1..], Encoding::Utf8, &mut out);
        assert_eq!(out, "ä");
    }

    #[test]
    fn test_long_input_crosses_chunks() {
        let input = "é".repeat(CHUNK);
        assert_eq!(recoded(Encoding::Utf8, input.as_bytes()), input);
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("UTF-8".parse::<Encoding>(), Ok(Encoding::Utf8));
        assert_eq!("utf_8".parse::<Encoding>(), Ok(Encoding::Utf8));
        assert_eq!("us_ascii".parse::<Encoding>(), Ok(Encoding::Ascii));
        assert_eq!(
            "latin1".parse::<Encoding>(),
            Ok(Encoding::Other(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            "cp1252".parse::<Encoding>(),
            Ok(Encoding::Other(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            "Shift_JIS".parse::<Encoding>(),
            Ok(Encoding::Other(encoding_rs::SHIFT_JIS))
        );
        assert!("utf-16".parse::<Encoding>().is_err());
        assert!(RecodeArgs::try_parse_from(["recode", "--encoding", "ebcdic"]).is_err());
    }

    #[test]
    fn test_legacy_encoding_output() {
        let latin1 = "latin1".parse().unwrap();
        assert_eq!(
            recoded(latin1, "Grüße 🙂\n".as_bytes()),
            "Gr\u{fffd}\u{fffd}e ?\n"
        );
        // encoded bytes that happen to be valid UTF-8 come out decoded
        assert_eq!(recoded(latin1, "Ã¤".as_bytes()), "ä");
    }
}
