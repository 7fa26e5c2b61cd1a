#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{FileOptions, ZipWriter};

pub type Table = Vec<Vec<String>>;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn cell_xml(text: &str) -> String {
    let paragraphs: String = text
        .split('\n')
        .map(|line| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                escape(line)
            )
        })
        .collect();
    format!("<w:tc>{}</w:tc>", paragraphs)
}

fn table_xml(table: &Table) -> String {
    let rows: String = table
        .iter()
        .map(|row| format!("<w:tr>{}</w:tr>", row.iter().map(|c| cell_xml(c)).collect::<String>()))
        .collect();
    format!("<w:tbl><w:tblPr/>{}</w:tbl>", rows)
}

pub fn table(rows: &[&[&str]]) -> Table {
    rows.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// 寫出只有本文表格的最小 .docx
pub fn write_docx(path: &Path, tables: &[Table]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body: String = tables
        .iter()
        .map(|t| format!("<w:p><w:r><w:t>Heading</w:t></w:r></w:p>{}", table_xml(t)))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    );

    let mut zip = ZipWriter::new(std::fs::File::create(path)?);
    zip.start_file::<_, ()>("[Content_Types].xml", FileOptions::default())?;
    zip.write_all(br#"<?xml version="1.0"?><Types/>"#)?;
    zip.start_file::<_, ()>("word/document.xml", FileOptions::default())?;
    zip.write_all(xml.as_bytes())?;
    zip.finish()?;
    Ok(())
}

/// v1 範本：表 0–8，評分只看 2、3、4、6、7、8
pub fn v1_tables(answered: bool) -> Vec<Table> {
    let answer = |text: &'static str| if answered { text } else { "" };
    vec![
        table(&[&["Project", "Template v1"]]),
        table(&[&["Revision", "Date"]]),
        table(&[
            &["1.1", answer("Groundwater monitoring")],
            &["1.2", ""],
            &["1.3", ""],
            &["1.4", answer("Borehole logs")],
            &["1.5", ""],
            &["1.6", answer("Numerical model")],
            &["1.7", answer("None")],
        ]),
        table(&[&["Data used", "Owner"], &[answer("Borehole logs"), answer("Survey")]]),
        table(&[&["Data generated", "Owner"], &[answer("Model output"), ""]]),
        table(&[&["Roles", "Name"]]),
        table(&[
            &["4.1", answer("Catalogue entry with DOI")],
            &["4.2", answer("Open access after embargo")],
            &["4.3", answer("NetCDF and CSV")],
            &["4.4", answer("CC-BY licence")],
        ]),
        table(&[
            &["5.1", ""],
            &["5.2", ""],
            &["5.3", ""],
            &["5.4", answer("Nightly backup to tape")],
        ]),
        table(&[
            &["6.1", ""],
            &["6.2", ""],
            &["6.3", ""],
            &["6.4", ""],
            &["6.5", answer("Archived for ten years")],
        ]),
    ]
}

const V2_CHECKBOX_SECTIONS: [&str; 11] = [
    "1.2", "1.3", "1.4", "1.5", "1.6", "1.8", "1.9", "1.10", "1.12", "1.13", "1.14",
];

/// v2 範本：章節編號在第一欄；`no_data` 時 1.5 勾選 No
pub fn v2_tables(answered: bool, no_data: bool) -> Vec<Table> {
    let mut general = vec![vec![
        "1.1 Project information".to_string(),
        if answered {
            "Project lead: Jane Doe\nProject number: 11206020".to_string()
        } else {
            "Project lead:\nProject number:".to_string()
        },
    ]];
    for key in V2_CHECKBOX_SECTIONS {
        let answer = if key == "1.5" && no_data {
            "☐ Yes ☒ No"
        } else if answered {
            "☒ Yes ☐ No"
        } else {
            "☐ Yes ☐ No"
        };
        general.push(vec![format!("{} Question", key), answer.to_string()]);
    }
    for key in ["1.7", "1.11"] {
        let answer = if answered { "Described in the project plan" } else { "Click here to enter text." };
        general.push(vec![format!("{} Description", key), answer.to_string()]);
    }

    let fair: Table = ["4.1", "4.2", "4.3", "4.4"]
        .iter()
        .map(|key| {
            vec![
                format!("{} FAIR", key),
                if answered { "Yes, see catalogue".to_string() } else { String::new() },
            ]
        })
        .collect();

    vec![table(&[&["Data Management Plan", "v2"]]), general, fair]
}

/// `<root>/<bucket>/<id>/A. Contractual items/<file>`
pub fn document_path(root: &Path, project_number: i64, file_name: &str) -> PathBuf {
    let bucket = project_number - project_number.rem_euclid(500);
    root.join(bucket.to_string())
        .join(project_number.to_string())
        .join("A. Contractual items")
        .join(file_name)
}

/// 讀回 CSV，每列一個欄名 → 值的 map
pub fn read_csv(path: &Path) -> anyhow::Result<(Vec<String>, Vec<std::collections::BTreeMap<String, String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        );
    }
    Ok((headers, rows))
}
