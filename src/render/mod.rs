//! Directory Index Rendering
//!
//! Turns an aggregated bucket listing into a browsable HTML index page:
//! title, breadcrumb trail, a parent-directory row, one row per folder and
//! one row per file. Entries are rendered in the order the bucket returned
//! them.

pub mod descriptions;

use crate::storage::ObjectRecord;
use chrono::{DateTime, Utc};
use descriptions::DescriptionIndex;

const TITLE_PREFIX: &str = "Index of /";
const PLACEHOLDER: &str = "&mdash;";
const SIZE_UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

const STYLE: &str = r#"
            .listing {
                font-family: monospace;
            }
            .listing table {
                width: 100%;
            }
            .listing td {
                white-space: nowrap;
            }
            .listing th, .listing td {
                text-align: left;
            }
"#;

/// Render the index page for `path` (always `/`-prefixed).
///
/// `files` and `folders` must already exclude the entry equal to the queried
/// prefix itself.
pub fn render_index(
    files: &[ObjectRecord],
    folders: &[String],
    path: &str,
    descriptions: &DescriptionIndex,
) -> String {
    let go_up = if path == "/" { String::new() } else { render_go_up() };

    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{title}</title>
        <style>{style}        </style>
    </head>
    <body>
    <h1>
        Index of / <a href="/">root</a> / {breadcrumbs}
    </h1>
    <hr>
    <main>
        <div class="listing">
            <table aria-describedby="summary">
                <thead>
                <tr>
                    <th class="hideable"></th>
                    <th class="name">Name</th>
                    <th class="description">Description</th>
                    <th class="size">Size</th>
                    <th class="date hideable">Modified</th>
                    <th class="hideable"></th>
                </tr>
                </thead>
                <tbody>
                {go_up}
                <!-- folders start -->{folders}
                <!-- files start -->{files}
                </tbody>
            </table>
        </div>
    </main>
    <hr>
    </body>
</html>
"#,
        title = escape_html(&render_title(path)),
        style = STYLE,
        breadcrumbs = render_breadcrumbs(path),
        go_up = go_up,
        folders = render_folders(folders, descriptions),
        files = render_files(files, descriptions),
    )
}

/// The page served when nothing in the bucket matches the requested path
pub fn render_not_found(hostname: &str) -> String {
    format!(
        r#"<html>
    <head><title>404 Not Found</title></head>
    <body>
        <center><h1>404 Not Found</h1></center>
        <hr><center>{}</center>
    </body>
</html>
"#,
        escape_html(hostname)
    )
}

/// Page title: fixed for the root, otherwise built from the last non-empty
/// path segment
pub fn render_title(path: &str) -> String {
    match path.split('/').filter(|s| !s.is_empty()).last() {
        Some(segment) => format!("{}{}", TITLE_PREFIX, segment),
        None => TITLE_PREFIX.to_string(),
    }
}

/// One link per non-empty segment, each pointing at the cumulative path up
/// to and including that segment
pub fn render_breadcrumbs(path: &str) -> String {
    let mut output = String::new();
    let mut current = String::from("/");
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push_str(segment);
        current.push('/');
        output.push_str(&format!(
            r#"<a href="{}">{}</a> / "#,
            escape_html(&encode_href(&current)),
            escape_html(segment)
        ));
    }
    output
}

fn render_go_up() -> String {
    format!(
        r#"
                <tr>
                    <td class="hideable"></td>
                    <td class="goup">
                        <a href="..">
                            ../
                        </a>
                    </td>
                    <td class="description">{p}</td>
                    <td class="size">{p}</td>
                    <td class="date hideable">{p}</td>
                    <td class="hideable"></td>
                </tr>
"#,
        p = PLACEHOLDER
    )
}

fn render_folders(folders: &[String], descriptions: &DescriptionIndex) -> String {
    let mut output = String::new();
    for folder in folders {
        let trimmed = folder.strip_suffix('/').unwrap_or(folder);
        let description = describe(descriptions, &format!("/{}", trimmed));
        output.push_str(&format!(
            r#"
                <tr class="file ">
                    <td class="hideable"></td>
                    <td class="name"><a href="{href}"><span class="name">{name}/</span></a></td>
                    <td class="description">{description}</td>
                    <td class="size">{p}</td>
                    <td class="date hideable">{p}</td>
                    <td class="hideable"></td>
                </tr>
"#,
            href = escape_html(&encode_href(&format!("/{}", folder))),
            name = escape_html(clean_folder_name(folder)),
            description = description,
            p = PLACEHOLDER,
        ));
    }
    output
}

fn render_files(files: &[ObjectRecord], descriptions: &DescriptionIndex) -> String {
    let mut output = String::new();
    for file in files {
        let description = describe(descriptions, &format!("/{}", file.key));
        output.push_str(&format!(
            r#"
                <tr class="file ">
                    <td class="hideable"></td>
                    <td class="name"><a href="{href}"><span class="name">{name}</span></a></td>
                    <td class="description">{description}</td>
                    <td class="size">{size}</td>
                    <td class="date hideable"><time datetime="{utc}">{iso}</time></td>
                    <td class="hideable"></td>
                </tr>
"#,
            href = escape_html(&encode_href(&format!("/{}", file.key))),
            name = escape_html(clean_file_name(&file.key)),
            description = description,
            size = human_file_size(file.size),
            utc = format_utc(&file.uploaded_at),
            iso = format_iso(&file.uploaded_at),
        ));
    }
    output
}

fn describe(descriptions: &DescriptionIndex, path: &str) -> String {
    descriptions
        .describe(path)
        .map(escape_html)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Last segment of a file key
pub fn clean_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Last segment of a folder prefix, without the trailing separator
pub fn clean_folder_name(prefix: &str) -> &str {
    let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Binary (base-1024) human-readable size with one decimal place.
///
/// Below 1024 the raw byte count is shown. Otherwise the unit advances while
/// the value, rounded to one decimal, is still at least 1024.
pub fn human_file_size(bytes: u64) -> String {
    const THRESHOLD: f64 = 1024.0;

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    loop {
        value /= THRESHOLD;
        let rounded = (value * 10.0).round() / 10.0;
        if rounded < THRESHOLD || unit == SIZE_UNITS.len() - 1 {
            break;
        }
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

/// HTTP-date style UTC string, e.g. `Tue, 02 Jan 2024 03:04:05 GMT`
fn format_utc(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// ISO-8601 with milliseconds, e.g. `2024-01-02T03:04:05.000Z`
fn format_iso(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Percent-encode each segment of a `/`-separated path, keeping separators
fn encode_href(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
