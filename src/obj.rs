use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};

use crate::geometry::{Geometry, FLOATS_PER_VERTEX};

const NORMAL_OFFSET: usize = 3;

/// Parses an OBJ file from memory into interleaved [`Geometry`].
///
/// Polygons are fan-triangulated. Texture coordinates are flipped to a
/// top-left origin. Vertices whose face corner carries no normal get the
/// area-weighted average of the adjoining face normals.
pub fn load_obj_from_str(data: &str) -> Result<Geometry> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "vt" => uvs.push(
                parse_vec2(parts)
                    .with_context(|| format!("invalid texture coordinate on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }
    if faces.is_empty() {
        return Err(anyhow!("OBJ file does not define any faces"));
    }

    let (mut geometry, missing_normals) = build_geometry(&positions, &normals, &uvs, &faces)?;
    if missing_normals.iter().any(|missing| *missing) {
        compute_normals(&mut geometry, &missing_normals);
    }
    Ok(geometry)
}

fn next_component<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<f32> {
    let text = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?;
    text.parse::<f32>()
        .with_context(|| format!("`{text}` is not a number"))
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = next_component(&mut parts)?;
    let y = next_component(&mut parts)?;
    let z = next_component(&mut parts)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = next_component(&mut parts)?;
    let v = next_component(&mut parts)?;
    Ok(Vec2::new(u, v))
}

fn parse_optional_index(segment: Option<&str>) -> Result<i32> {
    match segment {
        None | Some("") => Ok(0),
        Some(text) => text
            .parse::<i32>()
            .with_context(|| format!("`{text}` is not an index")),
    }
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()
            .with_context(|| format!("invalid vertex reference `{part}`"))?;
        let vt = parse_optional_index(segments.next())?;
        let vn = parse_optional_index(segments.next())?;
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn build_geometry(
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    faces: &[[FaceIndex; 3]],
) -> Result<(Geometry, Vec<bool>)> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut missing_normals = Vec::new();

    for face in faces {
        for idx in face {
            let position = fix_index(idx.v, positions.len())
                .ok_or_else(|| anyhow!("vertex index {} out of range", idx.v))?;
            let key = Key {
                position,
                uv: optional_index(idx.vt, uvs.len(), "texture coordinate")?,
                normal: optional_index(idx.vn, normals.len(), "normal")?,
            };
            let next_index = (vertices.len() / FLOATS_PER_VERTEX) as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                let p = positions[position];
                let n = key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                let uv = key.uv.map(|i| uvs[i]).unwrap_or(Vec2::ZERO);
                vertices.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, uv.x, 1.0 - uv.y]);
                missing_normals.push(key.normal.is_none());
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok((Geometry { vertices, indices }, missing_normals))
}

/// Resolves a `vt`/`vn` reference; zero means the corner has none.
fn optional_index(index: i32, len: usize, kind: &str) -> Result<Option<usize>> {
    if index == 0 {
        return Ok(None);
    }
    fix_index(index, len)
        .map(Some)
        .ok_or_else(|| anyhow!("{kind} index {index} out of range"))
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn compute_normals(geometry: &mut Geometry, missing: &[bool]) {
    let mut accum = vec![Vec3::ZERO; missing.len()];

    for triangle in geometry.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let p0 = geometry.position(i0);
        let p1 = geometry.position(i1);
        let p2 = geometry.position(i2);
        // Unnormalized cross product weights by triangle area.
        let normal = (p1 - p0).cross(p2 - p0);
        accum[i0] += normal;
        accum[i1] += normal;
        accum[i2] += normal;
    }

    for (i, normal) in accum.into_iter().enumerate() {
        if !missing[i] {
            continue;
        }
        let normal = normal.normalize_or_zero();
        let base = i * FLOATS_PER_VERTEX + NORMAL_OFFSET;
        geometry.vertices[base..base + 3].copy_from_slice(&normal.to_array());
    }
}
