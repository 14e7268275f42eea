// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GLB (binary glTF 2.0) point-scene support.
//!
//! The cloud is exported as a single scene with one mesh primitive in
//! POINTS mode: POSITION as float VEC3, COLOR_0 as normalized uchar VEC4.
//! Color quantization to 8 bits makes this the lossy of the two exports;
//! geometry survives exactly.
//!
//! The container is written by hand: a 12-byte header, a JSON chunk
//! (padded with spaces), and a BIN chunk (padded with zeros).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::json;

use crate::reconstruction::error::{ExportError, ExportResult};
use crate::reconstruction::point_cloud::PointCloud;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const COMPONENT_FLOAT: u64 = 5126;
const COMPONENT_UNSIGNED_BYTE: u64 = 5121;
const MODE_POINTS: u64 = 0;

/// Save a point cloud as a GLB point scene.
///
/// Point order and point/color pairing are identical to the PLY export;
/// only the color precision differs (quantized to `u8`, alpha fixed at
/// 255).
///
/// # Errors
///
/// Returns [`ExportError::EmptyCloud`] for zero points (glTF requires
/// POSITION bounds, so an empty primitive cannot be expressed), or an I/O
/// error if writing fails.
pub fn save_point_cloud_glb<P: AsRef<Path>>(cloud: &PointCloud, path: P) -> ExportResult<()> {
    if cloud.is_empty() {
        return Err(ExportError::EmptyCloud);
    }

    let count = cloud.len();

    // BIN chunk: positions (float VEC3), then colors (u8 RGBA)
    let positions_len = count * 12;
    let colors_len = count * 4;
    let mut bin = Vec::with_capacity(positions_len + colors_len);

    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for point in cloud.points() {
        for axis in 0..3 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
            bin.extend_from_slice(&point[axis].to_le_bytes());
        }
    }
    for color in cloud.colors() {
        for channel in color {
            bin.push(quantize_channel(*channel));
        }
        bin.push(255);
    }
    // positions_len and colors_len are both multiples of 4 already
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let gltf = json!({
        "asset": { "version": "2.0", "generator": "fabstir-photo3d-node" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0 } ],
        "meshes": [ {
            "primitives": [ {
                "attributes": { "POSITION": 0, "COLOR_0": 1 },
                "mode": MODE_POINTS
            } ]
        } ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": COMPONENT_FLOAT,
                "count": count,
                "type": "VEC3",
                "min": min,
                "max": max
            },
            {
                "bufferView": 1,
                "componentType": COMPONENT_UNSIGNED_BYTE,
                "normalized": true,
                "count": count,
                "type": "VEC4"
            }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": positions_len },
            { "buffer": 0, "byteOffset": positions_len, "byteLength": colors_len }
        ],
        "buffers": [ { "byteLength": bin.len() } ]
    });

    let mut json_bytes = serde_json::to_vec(&gltf)
        .map_err(|e| ExportError::invalid_content(format!("failed to encode glTF JSON: {e}")))?;
    // JSON chunks are padded with spaces per the GLB spec
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let total_len = 12 + 8 + json_bytes.len() + 8 + bin.len();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&GLB_MAGIC.to_le_bytes())?;
    writer.write_all(&GLB_VERSION.to_le_bytes())?;
    writer.write_all(&(total_len as u32).to_le_bytes())?;

    writer.write_all(&(json_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&CHUNK_JSON.to_le_bytes())?;
    writer.write_all(&json_bytes)?;

    writer.write_all(&(bin.len() as u32).to_le_bytes())?;
    writer.write_all(&CHUNK_BIN.to_le_bytes())?;
    writer.write_all(&bin)?;

    writer.flush()?;
    Ok(())
}

fn quantize_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Load a point cloud back from a GLB point scene written by this module.
///
/// Colors come back at 8-bit precision (`value / 255`); positions are
/// exact.
///
/// # Errors
///
/// Returns an error if the file is missing, truncated, or does not carry
/// a POSITION/COLOR_0 point primitive.
pub fn load_point_cloud_glb<P: AsRef<Path>>(path: P) -> ExportResult<PointCloud> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExportError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ExportError::Io(e)
        }
    })?;

    if bytes.len() < 12 {
        return Err(ExportError::invalid_content("GLB file is truncated"));
    }
    if read_u32(&bytes, 0)? != GLB_MAGIC {
        return Err(ExportError::invalid_content("not a GLB file (bad magic)"));
    }
    if read_u32(&bytes, 4)? != GLB_VERSION {
        return Err(ExportError::invalid_content("unsupported GLB version"));
    }

    // Walk the chunk list
    let mut json_chunk: Option<&[u8]> = None;
    let mut bin_chunk: Option<&[u8]> = None;
    let mut offset = 12usize;
    while offset + 8 <= bytes.len() {
        let chunk_len = read_u32(&bytes, offset)? as usize;
        let chunk_type = read_u32(&bytes, offset + 4)?;
        let start = offset + 8;
        let end = start
            .checked_add(chunk_len)
            .filter(|&e| e <= bytes.len())
            .ok_or_else(|| ExportError::invalid_content("GLB chunk overruns file"))?;

        match chunk_type {
            CHUNK_JSON => json_chunk = Some(&bytes[start..end]),
            CHUNK_BIN => bin_chunk = Some(&bytes[start..end]),
            _ => {}
        }
        offset = end;
    }

    let json_chunk =
        json_chunk.ok_or_else(|| ExportError::invalid_content("GLB has no JSON chunk"))?;
    let bin_chunk = bin_chunk.ok_or_else(|| ExportError::invalid_content("GLB has no BIN chunk"))?;

    let gltf: serde_json::Value = serde_json::from_slice(json_chunk)
        .map_err(|e| ExportError::invalid_content(format!("invalid glTF JSON: {e}")))?;

    let attributes = gltf["meshes"][0]["primitives"][0]["attributes"].clone();
    let position_accessor = attributes["POSITION"]
        .as_u64()
        .ok_or_else(|| ExportError::invalid_content("primitive has no POSITION attribute"))?;
    let color_accessor = attributes["COLOR_0"]
        .as_u64()
        .ok_or_else(|| ExportError::invalid_content("primitive has no COLOR_0 attribute"))?;

    let positions = accessor_bytes(&gltf, position_accessor, bin_chunk)?;
    let colors = accessor_bytes(&gltf, color_accessor, bin_chunk)?;

    let count = positions.len() / 12;
    if colors.len() / 4 != count {
        return Err(ExportError::invalid_content(
            "POSITION and COLOR_0 accessors disagree on point count",
        ));
    }

    let mut cloud = PointCloud::with_capacity(count);
    for i in 0..count {
        let p = &positions[i * 12..i * 12 + 12];
        let c = &colors[i * 4..i * 4 + 4];
        cloud.push(
            [
                f32::from_le_bytes([p[0], p[1], p[2], p[3]]),
                f32::from_le_bytes([p[4], p[5], p[6], p[7]]),
                f32::from_le_bytes([p[8], p[9], p[10], p[11]]),
            ],
            [
                f32::from(c[0]) / 255.0,
                f32::from(c[1]) / 255.0,
                f32::from(c[2]) / 255.0,
            ],
        );
    }

    Ok(cloud)
}

fn read_u32(bytes: &[u8], offset: usize) -> ExportResult<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| ExportError::invalid_content("GLB file is truncated"))
}

/// Resolve an accessor to its backing byte range in the BIN chunk.
fn accessor_bytes<'a>(
    gltf: &serde_json::Value,
    accessor_index: u64,
    bin: &'a [u8],
) -> ExportResult<&'a [u8]> {
    let accessor = &gltf["accessors"][accessor_index as usize];
    let view_index = accessor["bufferView"]
        .as_u64()
        .ok_or_else(|| ExportError::invalid_content("accessor has no bufferView"))?;

    let view = &gltf["bufferViews"][view_index as usize];
    let byte_offset = view["byteOffset"].as_u64().unwrap_or(0) as usize;
    let byte_length = view["byteLength"]
        .as_u64()
        .ok_or_else(|| ExportError::invalid_content("bufferView has no byteLength"))?
        as usize;

    bin.get(byte_offset..byte_offset + byte_length)
        .ok_or_else(|| ExportError::invalid_content("bufferView overruns BIN chunk"))
}
