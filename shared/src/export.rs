use std::io::{self, Write};

use crate::Tire;

const HEADER: [&str; 9] = ["id", "brand", "size", "type", "condition", "stock", "price", "created", "updated"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Writes tires as CSV with a header row. Fields are quoted only when needed.
pub fn write_csv<W: Write>(mut out: W, tires: &[Tire]) -> io::Result<()> {
    write_row(&mut out, HEADER.iter().map(|h| h.to_string()))?;
    for tire in tires {
        write_row(
            &mut out,
            [
                tire.id.to_string(),
                tire.brand.clone(),
                tire.size.clone(),
                tire.tire_type.to_string(),
                tire.condition.to_string(),
                tire.stock.to_string(),
                tire.price.as_ref().map(ToString::to_string).unwrap_or_default(),
                tire.created_at.format(TIMESTAMP_FORMAT).to_string(),
                tire.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
    }
    out.flush()
}

fn write_row<W: Write>(out: &mut W, fields: impl IntoIterator<Item = String>) -> io::Result<()> {
    let line = fields.into_iter().map(|f| escape(&f)).collect::<Vec<_>>().join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
