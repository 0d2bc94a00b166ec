//! Image metadata reader (EXIF).

use std::collections::BTreeMap;
use std::io::Cursor;

use exif::{Context, Exif, In, Reader, Tag};
use strata_schema::Value;

/// Read the EXIF block of a JPEG/PNG/TIFF image.
///
/// Produces `{"exif": {...}}` keyed by tag name. GPS tags are collapsed into
/// a single `GPS` object in decimal degrees. Images without readable EXIF
/// data produce `{"exif": null, "size_bytes": n}`.
pub fn read_image(content: &[u8]) -> Value {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(content)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("No EXIF data: {}", e);
            return no_exif(content);
        }
    };

    let tags = exif_fields(&exif);
    if tags.is_empty() {
        return no_exif(content);
    }
    Value::map([("exif", Value::Map(tags))])
}

fn no_exif(content: &[u8]) -> Value {
    Value::map([
        ("exif", Value::Null),
        ("size_bytes", Value::Integer(content.len() as i64)),
    ])
}

fn exif_fields(exif: &Exif) -> BTreeMap<String, Value> {
    let mut tags = BTreeMap::new();

    for field in exif.fields() {
        if field.tag.context() == Context::Gps || is_pointer(field.tag) {
            continue;
        }
        // The thumbnail IFD repeats primary tags; keep the primary ones.
        tags.entry(field.tag.to_string())
            .or_insert_with(|| convert(&field.value));
    }

    if let Some(gps) = gps_position(exif) {
        tags.insert("GPS".to_string(), gps);
    }
    tags
}

fn is_pointer(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::ExifIFDPointer | Tag::GPSInfoIFDPointer | Tag::InteropIFDPointer
    )
}

/// Convert an EXIF value; single components become scalars.
fn convert(value: &exif::Value) -> Value {
    let mut items: Vec<Value> = match value {
        exif::Value::Ascii(strings) => strings
            .iter()
            .map(|s| Value::Text(String::from_utf8_lossy(s).trim_end_matches('\0').to_string()))
            .collect(),
        exif::Value::Byte(v) => v.iter().map(|&n| Value::Integer(n.into())).collect(),
        exif::Value::Short(v) => v.iter().map(|&n| Value::Integer(n.into())).collect(),
        exif::Value::Long(v) => v.iter().map(|&n| Value::Integer(n.into())).collect(),
        exif::Value::SByte(v) => v.iter().map(|&n| Value::Integer(n.into())).collect(),
        exif::Value::SShort(v) => v.iter().map(|&n| Value::Integer(n.into())).collect(),
        exif::Value::SLong(v) => v.iter().map(|&n| Value::Integer(n.into())).collect(),
        exif::Value::Rational(v) => v.iter().map(|r| Value::Float(r.to_f64())).collect(),
        exif::Value::SRational(v) => v.iter().map(|r| Value::Float(r.to_f64())).collect(),
        exif::Value::Float(v) => v.iter().map(|&f| Value::Float(f.into())).collect(),
        exif::Value::Double(v) => v.iter().map(|&f| Value::Float(f)).collect(),
        exif::Value::Undefined(bytes, _) => return Value::Bytes(bytes.clone()),
        exif::Value::Unknown(..) => return Value::Null,
    };

    if items.len() == 1 {
        items.remove(0)
    } else {
        Value::List(items)
    }
}

fn gps_position(exif: &Exif) -> Option<Value> {
    let lat = degrees(exif, Tag::GPSLatitude)?;
    let lon = degrees(exif, Tag::GPSLongitude)?;

    Some(Value::map([
        ("lat", Value::Float(lat)),
        ("lon", Value::Float(lon)),
        ("lat_ref", Value::from(ascii(exif, Tag::GPSLatitudeRef))),
        ("lon_ref", Value::from(ascii(exif, Tag::GPSLongitudeRef))),
    ]))
}

fn degrees(exif: &Exif, tag: Tag) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        exif::Value::Rational(parts) => {
            let parts: Vec<f64> = parts.iter().map(|r| r.to_f64()).collect();
            dms_to_degrees(&parts)
        }
        _ => None,
    }
}

/// `[degrees, minutes, seconds]` to decimal degrees.
fn dms_to_degrees(parts: &[f64]) -> Option<f64> {
    match parts {
        [d, m, s, ..] => Some(d + m / 60.0 + s / 3600.0),
        _ => None,
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        exif::Value::Ascii(strings) => strings
            .first()
            .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string()),
        _ => None,
    }
}
