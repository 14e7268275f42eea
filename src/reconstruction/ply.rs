// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PLY (Polygon File Format) point-cloud support.
//!
//! The write side targets binary little-endian with six `float`
//! properties per vertex (x, y, z, red, green, blue). Storing colors as
//! floats keeps the export lossless with respect to the in-memory cloud;
//! the GLB export is where colors get quantized.
//!
//! # Example
//!
//! ```no_run
//! use fabstir_photo3d_node::reconstruction::{load_point_cloud_ply, save_point_cloud_ply, PointCloud};
//!
//! let mut cloud = PointCloud::new();
//! cloud.push([0.0, 1.0, 0.5], [0.2, 0.4, 0.6]);
//! save_point_cloud_ply(&cloud, "cloud.ply").unwrap();
//! let restored = load_point_cloud_ply("cloud.ply").unwrap();
//! assert_eq!(restored.len(), 1);
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::reconstruction::error::{ExportError, ExportResult};
use crate::reconstruction::point_cloud::PointCloud;

/// Save a point cloud as binary little-endian PLY.
///
/// The header is written by hand (ply-rs mishandles binary payloads in
/// some cases, and a flat vertex list does not need its writer).
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_point_cloud_ply<P: AsRef<Path>>(cloud: &PointCloud, path: P) -> ExportResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "comment Generated by fabstir-photo3d-node")?;
    writeln!(writer, "element vertex {}", cloud.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "property float red")?;
    writeln!(writer, "property float green")?;
    writeln!(writer, "property float blue")?;
    writeln!(writer, "end_header")?;

    // Write vertex data
    for (point, color) in cloud.iter() {
        for value in point {
            writer.write_all(&value.to_le_bytes())?;
        }
        for value in color {
            writer.write_all(&value.to_le_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Load a point cloud from a PLY file.
///
/// Accepts ASCII and both binary encodings. Colors may be stored as
/// float/double in `[0, 1]` or as uchar in `[0, 255]`; missing color
/// properties default to black.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or not valid PLY.
pub fn load_point_cloud_ply<P: AsRef<Path>>(path: P) -> ExportResult<PointCloud> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExportError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ExportError::Io(e)
        }
    })?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();

    let header = parser
        .read_header(&mut reader)
        .map_err(|e| ExportError::invalid_content(format!("failed to parse PLY header: {e}")))?;

    let payload = parser
        .read_payload(&mut reader, &header)
        .map_err(|e| ExportError::invalid_content(format!("failed to read PLY payload: {e}")))?;

    let mut cloud = PointCloud::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        for element in vertex_elements {
            let x = get_float_property(element, "x").unwrap_or(0.0);
            let y = get_float_property(element, "y").unwrap_or(0.0);
            let z = get_float_property(element, "z").unwrap_or(0.0);
            let red = get_color_property(element, "red").unwrap_or(0.0);
            let green = get_color_property(element, "green").unwrap_or(0.0);
            let blue = get_color_property(element, "blue").unwrap_or(0.0);
            cloud.push([x, y, z], [red, green, blue]);
        }
    }

    Ok(cloud)
}

/// Extract a float property from a PLY element.
fn get_float_property(element: &DefaultElement, key: &str) -> Option<f32> {
    match element.get(key)? {
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        _ => None,
    }
}

/// Extract a color channel, normalizing uchar storage to `[0, 1]`.
fn get_color_property(element: &DefaultElement, key: &str) -> Option<f32> {
    match element.get(key)? {
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        Property::UChar(v) => Some(f32::from(*v) / 255.0),
        _ => None,
    }
}
