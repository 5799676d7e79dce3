//! Wavefront OBJ reader for cascade meshes.
//!
//! Only positions, texture coordinates and faces matter to the appearance
//! program. Each `o`/`g` statement starts a new child mesh.

use crate::AssetError;

/// One triangulated mesh group, de-indexed per face corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A parsed OBJ file: one or more mesh groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub meshes: Vec<MeshData>,
}

impl ObjModel {
    pub fn parse(bytes: &[u8]) -> Result<Self, AssetError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AssetError::ObjParse(format!("not UTF-8: {e}")))?;

        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut meshes: Vec<MeshData> = Vec::new();
        let mut current = MeshData::default();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" if parts.len() >= 4 => {
                    positions.push([
                        parse_float(parts[1], line_no)?,
                        parse_float(parts[2], line_no)?,
                        parse_float(parts[3], line_no)?,
                    ]);
                }
                "vt" if parts.len() >= 3 => {
                    tex_coords.push([parse_float(parts[1], line_no)?, parse_float(parts[2], line_no)?]);
                }
                "o" | "g" => {
                    let name = parts[1..].join(" ");
                    if current.indices.is_empty() {
                        current.name = name;
                    } else {
                        meshes.push(std::mem::take(&mut current));
                        current.name = name;
                    }
                }
                "f" if parts.len() >= 4 => {
                    let corners: Vec<(usize, Option<usize>)> = parts[1..]
                        .iter()
                        .map(|v| parse_corner(v, positions.len(), tex_coords.len(), line_no))
                        .collect::<Result<_, _>>()?;

                    // fan triangulation
                    for i in 1..corners.len() - 1 {
                        for &k in &[0, i, i + 1] {
                            let (vi, vti) = corners[k];
                            current.indices.push(current.positions.len() as u32);
                            current.positions.push(positions[vi]);
                            current
                                .uvs
                                .push(vti.map(|t| tex_coords[t]).unwrap_or([0.0, 0.0]));
                        }
                    }
                }
                _ => {}
            }
        }

        if !current.indices.is_empty() {
            meshes.push(current);
        }
        if meshes.is_empty() {
            return Err(AssetError::ObjParse("no faces found".into()));
        }

        tracing::trace!(
            groups = meshes.len(),
            vertices = meshes.iter().map(MeshData::vertex_count).sum::<usize>(),
            "parsed OBJ"
        );
        Ok(Self { meshes })
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshData::vertex_count).sum()
    }
}

fn parse_float(s: &str, line_no: usize) -> Result<f32, AssetError> {
    s.parse()
        .map_err(|_| AssetError::ObjParse(format!("line {}: bad number {s:?}", line_no + 1)))
}

/// Resolve a 1-based (or negative, relative) OBJ index.
fn resolve_index(s: &str, len: usize, line_no: usize) -> Result<usize, AssetError> {
    let bad = || AssetError::ObjParse(format!("line {}: bad index {s:?}", line_no + 1));
    let raw: i64 = s.parse().map_err(|_| bad())?;
    let idx = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        len as i64 + raw
    } else {
        return Err(bad());
    };
    if idx < 0 || idx as usize >= len {
        return Err(bad());
    }
    Ok(idx as usize)
}

/// Parse a face corner: `v`, `v/vt`, `v/vt/vn` or `v//vn`.
fn parse_corner(
    s: &str,
    position_count: usize,
    uv_count: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>), AssetError> {
    let mut parts = s.split('/');
    let vi = resolve_index(parts.next().unwrap_or(""), position_count, line_no)?;
    let vti = match parts.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, uv_count, line_no)?),
        _ => None,
    };
    Ok((vi, vti))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn quad_is_fan_triangulated() {
        let model = ObjModel::parse(QUAD.as_bytes()).unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.positions[3], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.uvs[5], [0.0, 1.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn groups_split_into_meshes() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
o first
f 1 2 3
o second
f -3 -2 -1
";
        let model = ObjModel::parse(src.as_bytes()).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].name, "first");
        assert_eq!(model.meshes[1].name, "second");
        assert_eq!(model.meshes[1].positions, model.meshes[0].positions);
        assert_eq!(model.meshes[1].uvs[0], [0.0, 0.0]);
        assert_eq!(model.vertex_count(), 6);
    }

    #[test]
    fn normals_in_corners_are_ignored() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let model = ObjModel::parse(src.as_bytes()).unwrap();
        assert_eq!(model.meshes[0].triangle_count(), 1);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let src = "v 0 0 0\nf 1 2 3\n";
        assert!(matches!(
            ObjModel::parse(src.as_bytes()),
            Err(AssetError::ObjParse(_))
        ));
    }

    #[test]
    fn faceless_file_is_an_error() {
        assert!(ObjModel::parse(b"v 0 0 0\n").is_err());
    }
}
