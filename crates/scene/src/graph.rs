use std::sync::Arc;

use cascadeview_assets::{MeshData, ObjModel};

use crate::AppearanceMaterial;

/// A renderable leaf: geometry plus the program state it is drawn with.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub mesh: Arc<MeshData>,
    pub material: AppearanceMaterial,
}

/// Scene graph node.
#[derive(Debug, Clone)]
pub enum SceneNode {
    Group {
        name: String,
        children: Vec<SceneNode>,
    },
    Mesh(MeshNode),
    /// Non-renderable node (helpers, empties).
    Other { name: String },
}

impl SceneNode {
    /// Group with one mesh child per OBJ group, all sharing `material`.
    pub fn from_obj(name: impl Into<String>, model: &ObjModel, material: &AppearanceMaterial) -> Self {
        let children = model
            .meshes
            .iter()
            .map(|mesh| {
                SceneNode::Mesh(MeshNode {
                    mesh: Arc::new(mesh.clone()),
                    material: material.clone(),
                })
            })
            .collect();
        SceneNode::Group {
            name: name.into(),
            children,
        }
    }

    /// Visit every mesh leaf, depth first.
    pub fn visit_meshes<'a>(&'a self, f: &mut impl FnMut(&'a MeshNode)) {
        match self {
            SceneNode::Group { children, .. } => {
                for child in children {
                    child.visit_meshes(f);
                }
            }
            SceneNode::Mesh(mesh) => f(mesh),
            SceneNode::Other { .. } => {}
        }
    }

    /// Visit every mesh leaf mutably, depth first.
    pub fn visit_meshes_mut(&mut self, f: &mut impl FnMut(&mut MeshNode)) {
        match self {
            SceneNode::Group { children, .. } => {
                for child in children {
                    child.visit_meshes_mut(f);
                }
            }
            SceneNode::Mesh(mesh) => f(mesh),
            SceneNode::Other { .. } => {}
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit_meshes(&mut |_| count += 1);
        count
    }

    /// Material of the first mesh leaf.
    pub fn first_material(&self) -> Option<&AppearanceMaterial> {
        let mut found = None;
        self.visit_meshes(&mut |m| {
            if found.is_none() {
                found = Some(&m.material);
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascadeview_assets::TextureData;
    use cascadeview_common::RenderMode;
    use cascadeview_network::{AppearanceNetwork, WeightMatrix};

    fn material() -> AppearanceMaterial {
        let l0 = WeightMatrix::from_fn(6, 4, |_, _| 0.0).unwrap();
        let l1 = WeightMatrix::from_fn(4, 3, |_, _| 0.0).unwrap();
        AppearanceMaterial::new(
            Arc::new(AppearanceNetwork::from_layers(&l0, &l1).unwrap()),
            Arc::new(TextureData::solid(1, 1, [0, 0, 0, 255])),
            Arc::new(TextureData::solid(1, 1, [0, 0, 0, 255])),
        )
    }

    fn leaf() -> SceneNode {
        SceneNode::Mesh(MeshNode {
            mesh: Arc::new(MeshData::default()),
            material: material(),
        })
    }

    #[test]
    fn traversal_reaches_nested_meshes_only() {
        let mut root = SceneNode::Group {
            name: "root".into(),
            children: vec![
                leaf(),
                SceneNode::Other { name: "helper".into() },
                SceneNode::Group {
                    name: "inner".into(),
                    children: vec![leaf(), leaf()],
                },
            ],
        };
        assert_eq!(root.mesh_count(), 3);

        root.visit_meshes_mut(&mut |m| m.material.mode = RenderMode::SpecularOnly);
        let mut modes = Vec::new();
        root.visit_meshes(&mut |m| modes.push(m.material.mode));
        assert_eq!(modes, vec![RenderMode::SpecularOnly; 3]);
    }

    #[test]
    fn from_obj_shares_material_across_groups() {
        let model = ObjModel::parse(b"v 0 0 0\nv 1 0 0\nv 0 1 0\ng a\nf 1 2 3\ng b\nf 1 2 3\n")
            .unwrap();
        let m = material();
        let node = SceneNode::from_obj("mesh_0", &model, &m);
        assert_eq!(node.mesh_count(), 2);
        assert!(node.first_material().unwrap().shares_resources(&m));
    }

    #[test]
    fn empty_group_has_no_material() {
        let node = SceneNode::Group {
            name: "empty".into(),
            children: vec![],
        };
        assert!(node.first_material().is_none());
    }
}
