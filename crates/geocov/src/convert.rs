//! Conversion of line-delimited JSON post dumps into lean raw CSV.
//!
//! Each input line holds one post object as returned by the platform API.
//! The output uses the lean raw layout, so it can be listed directly as a
//! batch with `layout: lean`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GeocovError, Result};

/// Header written at the top of every converted file.
pub const LEAN_HEADER: [&str; 9] = [
    "id",
    "created_at",
    "reweet_id",
    "user_screen_name",
    "user_followers_count",
    "user_friends_count",
    "retweet_count",
    "favourite_count",
    "text",
];

const PROGRESS_EVERY: usize = 100_000;

#[derive(Debug, Deserialize)]
struct JsonPost {
    id_str: Option<String>,
    id: Option<u64>,
    created_at: Option<String>,
    retweeted_status: Option<JsonReshare>,
    #[serde(default)]
    user: JsonUser,
    retweet_count: Option<u64>,
    favorite_count: Option<u64>,
    full_text: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonReshare {
    id_str: Option<String>,
    id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonUser {
    screen_name: Option<String>,
    followers_count: Option<u64>,
    friends_count: Option<u64>,
}

impl JsonPost {
    fn into_record(self) -> Option<[String; 9]> {
        let id = self.id_str.or_else(|| self.id.map(|n| n.to_string()))?;
        let reshare_of = self
            .retweeted_status
            .and_then(|r| r.id_str.or_else(|| r.id.map(|n| n.to_string())))
            .unwrap_or_default();
        let text = self.full_text.or(self.text).unwrap_or_default();

        Some([
            id,
            self.created_at.unwrap_or_default(),
            reshare_of,
            self.user.screen_name.unwrap_or_default(),
            count(self.user.followers_count),
            count(self.user.friends_count),
            count(self.retweet_count),
            count(self.favorite_count),
            text,
        ])
    }
}

fn count(value: Option<u64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Line counts from one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Non-blank lines read.
    pub lines_read: usize,
    pub rows_written: usize,
    /// Lines that did not decode or carried no id.
    pub lines_skipped: usize,
}

/// Convert a JSONL dump at `input` into a lean raw CSV at `output`.
///
/// `output` must not exist yet. Blank lines are ignored; lines that fail to
/// decode are skipped and counted.
pub fn convert_jsonl(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ConversionReport> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.is_file() {
        return Err(GeocovError::SourceNotFound {
            path: input.to_path_buf(),
        });
    }

    let reader = BufReader::new(File::open(input).map_err(|e| GeocovError::io(input, e))?);
    let sink = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|e| GeocovError::io(output, e))?;

    info!(input = %input.display(), output = %output.display(), "conversion started");

    let result = convert_lines(reader, sink, input, output);
    match &result {
        Ok(report) => info!(
            rows_written = report.rows_written,
            lines_skipped = report.lines_skipped,
            "conversion finished"
        ),
        Err(_) => {
            let _ = fs::remove_file(output);
        }
    }
    result
}

fn convert_lines<R: BufRead, W: Write>(
    mut reader: R,
    sink: W,
    input: &Path,
    output: &Path,
) -> Result<ConversionReport> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(sink);
    writer.write_record(LEAN_HEADER)?;

    let mut report = ConversionReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| GeocovError::io(input, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }
        report.lines_read += 1;

        // Raw bytes: a line that is not UTF-8 is skipped like any other bad line
        let record = match serde_json::from_slice::<JsonPost>(line) {
            Ok(post) => post.into_record(),
            Err(e) => {
                debug!(line = line_no, error = %e, "line skipped");
                None
            }
        };

        match record {
            Some(record) => {
                writer.write_record(&record)?;
                report.rows_written += 1;
            }
            None => report.lines_skipped += 1,
        }

        if report.lines_read % PROGRESS_EVERY == 0 {
            info!(lines = report.lines_read, "conversion progress");
        }
    }

    writer.flush().map_err(|e| GeocovError::io(output, e))?;
    Ok(report)
}
