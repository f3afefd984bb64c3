use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::input::{Command, KeyBindings, KeyCode};
use crate::lantern::DEFAULT_SPARK_TICKS;

/// Runtime representation of a stage: the collidable surfaces extracted
/// from the imported environment mesh, the lantern holder positions, and
/// tuning the pack author may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stage {
    pub surfaces: Vec<Surface>,
    pub lantern_holders: Vec<Vec3>,
    pub models: Vec<ModelRef>,
    pub spawn: Vec3,
    pub spark_ticks: u32,
    #[serde(default)]
    pub binding_overrides: Vec<BindingOverride>,
}

impl Stage {
    /// Parses the stage XML produced by the authoring tools.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid stage XML")?;
        let root = document.root_element();
        if !root.has_tag_name("stage") {
            return Err(anyhow!("expected <stage> root element"));
        }

        let mut stage = Stage {
            spark_ticks: DEFAULT_SPARK_TICKS,
            ..Stage::default()
        };

        for node in root.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "surface" => stage.surfaces.push(parse_surface(&node)?),
                "lantern" => {
                    let position =
                        parse_vec3(required_text(&node, "position")?.as_str()).with_context(
                            || format!("bad lantern position #{}", stage.lantern_holders.len()),
                        )?;
                    stage.lantern_holders.push(position);
                }
                "model" => stage.models.push(ModelRef {
                    name: required_text(&node, "name")?,
                    file: required_text(&node, "file")?,
                }),
                "spawn" => {
                    stage.spawn = parse_vec3(node_text(&node)?).context("bad spawn position")?
                }
                "spark" => {
                    stage.spark_ticks = node_text(&node)?
                        .parse::<u32>()
                        .context("spark lifetime must be a tick count")?
                }
                "bindings" => {
                    for bind in node.children().filter(|n| n.has_tag_name("bind")) {
                        stage.binding_overrides.push(parse_binding(&bind)?);
                    }
                }
                other => return Err(anyhow!("unknown stage element <{other}>")),
            }
        }

        Ok(stage)
    }

    /// Builds the binding table: the defaults with the manifest's
    /// overrides applied on top.
    pub fn key_bindings(&self) -> Result<KeyBindings> {
        let mut bindings = KeyBindings::default();
        for over in &self.binding_overrides {
            let key = KeyCode::from_name(&over.key)
                .ok_or_else(|| anyhow!("unknown key name {:?}", over.key))?;
            let command = Command::from_name(&over.command)
                .ok_or_else(|| anyhow!("unknown command {:?}", over.command))?;
            bindings.bind(key, command);
        }
        Ok(bindings)
    }
}

/// Axis-aligned collidable slab extracted from the environment mesh.
///
/// Visibility and pickability follow the surface kind the author assigns
/// at mesh import: grounds are neither picked nor collided (box colliders
/// cover them), collision volumes are invisible but pickable, triggers are
/// inert to both systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub name: String,
    pub kind: SurfaceKind,
    pub min: Vec3,
    pub max: Vec3,
    /// Surface normal reported to ray probes. Non-up normals combined with
    /// the stair tag drive slope traversal.
    pub normal: Vec3,
    /// Explicit stair tag, set at authoring time. Stair surfaces suppress
    /// gravity while the player climbs them.
    pub stair: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Ordinary visible geometry: collidable and pickable.
    #[default]
    Mesh,
    /// Visible ground excluded from both systems.
    Ground,
    /// Invisible collision volume: pickable, collidable.
    Collision,
    /// Trigger volume: neither pickable nor collidable.
    Trigger,
}

impl SurfaceKind {
    fn from_name(name: &str) -> Result<Self> {
        let kind = match name {
            "mesh" => Self::Mesh,
            "ground" => Self::Ground,
            "collision" => Self::Collision,
            "trigger" => Self::Trigger,
            other => return Err(anyhow!("unknown surface kind {other:?}")),
        };
        Ok(kind)
    }

    /// Eligible for ray probes (grounded / stair checks).
    pub fn pickable(self) -> bool {
        matches!(self, Self::Mesh | Self::Collision)
    }

    /// Participates in collision-aware displacement.
    pub fn collidable(self) -> bool {
        matches!(self, Self::Mesh | Self::Collision)
    }
}

/// Reference to a binary model blob bundled in the pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub name: String,
    pub file: String,
}

/// Key rebinding entry from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingOverride {
    pub command: String,
    pub key: String,
}

fn parse_surface(node: &Node<'_, '_>) -> Result<Surface> {
    let name = required_text(node, "name")?;
    let kind = match optional_text(node, "kind") {
        Some(text) => SurfaceKind::from_name(&text)
            .with_context(|| format!("surface {name:?} has a bad kind"))?,
        None => SurfaceKind::default(),
    };
    let min = parse_vec3(required_text(node, "min")?.as_str())
        .with_context(|| format!("surface {name:?} has a bad min corner"))?;
    let max = parse_vec3(required_text(node, "max")?.as_str())
        .with_context(|| format!("surface {name:?} has a bad max corner"))?;
    if min.x > max.x || min.y > max.y || min.z > max.z {
        return Err(anyhow!("surface {name:?} has inverted corners"));
    }
    let normal = match optional_text(node, "normal") {
        Some(text) => parse_vec3(&text)
            .with_context(|| format!("surface {name:?} has a bad normal"))?
            .normalize_or_zero(),
        None => Vec3::Y,
    };
    let stair = match optional_text(node, "stair") {
        Some(text) => text
            .parse::<bool>()
            .with_context(|| format!("surface {name:?} has a non-boolean stair tag"))?,
        None => false,
    };
    Ok(Surface {
        name,
        kind,
        min,
        max,
        normal,
        stair,
    })
}

fn parse_binding(node: &Node<'_, '_>) -> Result<BindingOverride> {
    let command = node
        .attribute("command")
        .ok_or_else(|| anyhow!("<bind> is missing the command attribute"))?;
    let key = node
        .attribute("key")
        .ok_or_else(|| anyhow!("<bind> is missing the key attribute"))?;
    Ok(BindingOverride {
        command: command.to_string(),
        key: key.to_string(),
    })
}

fn node_text<'a>(node: &'a Node<'_, '_>) -> Result<&'a str> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| anyhow!("<{}> has no text content", node.tag_name().name()))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: &str) -> Result<Vec3> {
    let mut numbers = value
        .split_whitespace()
        .map(|component| component.parse::<f32>());
    let mut next = || -> Result<f32> {
        numbers
            .next()
            .ok_or_else(|| anyhow!("vector is missing components"))?
            .map_err(|err| anyhow!("bad vector component: {err}"))
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;

    const SAMPLE: &str = r#"
    <stage>
        <spawn>0 1.5 0</spawn>
        <spark>600</spark>
        <model>
            <name>environment</name>
            <file>models/env.glb</file>
        </model>
        <surface>
            <name>courtyard</name>
            <kind>collision</kind>
            <min>-12 -1 -12</min>
            <max>12 0 12</max>
        </surface>
        <surface>
            <name>shrine steps</name>
            <min>2 0 2</min>
            <max>4 1.5 4</max>
            <normal>0 0.9 0.2</normal>
            <stair>true</stair>
        </surface>
        <lantern><position>3 0 3</position></lantern>
        <lantern><position>-3 0 3</position></lantern>
        <bindings>
            <bind command="jump" key="Enter"/>
        </bindings>
    </stage>
    "#;

    #[test]
    fn parse_stage_populates_everything() {
        let stage = Stage::from_xml(SAMPLE).unwrap();
        assert_eq!(stage.spawn, Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(stage.spark_ticks, 600);
        assert_eq!(stage.models.len(), 1);
        assert_eq!(stage.models[0].file, "models/env.glb");
        assert_eq!(stage.surfaces.len(), 2);
        assert_eq!(stage.lantern_holders.len(), 2);

        let steps = &stage.surfaces[1];
        assert!(steps.stair);
        assert_ne!(steps.normal, Vec3::Y);
        assert!((steps.normal.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn surface_kinds_control_pickability() {
        let stage = Stage::from_xml(SAMPLE).unwrap();
        assert_eq!(stage.surfaces[0].kind, SurfaceKind::Collision);
        assert!(stage.surfaces[0].kind.pickable());
        assert!(!SurfaceKind::Ground.pickable());
        assert!(!SurfaceKind::Trigger.collidable());
    }

    #[test]
    fn binding_overrides_apply_over_defaults() {
        let stage = Stage::from_xml(SAMPLE).unwrap();
        let bindings = stage.key_bindings().unwrap();
        assert_eq!(
            bindings.resolve(KeyCode::Named(NamedKey::Enter)),
            Some(Command::Jump)
        );
        // Untouched defaults survive.
        assert_eq!(
            bindings.resolve(KeyCode::Named(NamedKey::Up)),
            Some(Command::Forward)
        );
    }

    #[test]
    fn defaults_apply_when_elements_are_absent() {
        let stage = Stage::from_xml("<stage></stage>").unwrap();
        assert_eq!(stage.spark_ticks, DEFAULT_SPARK_TICKS);
        assert_eq!(stage.spawn, Vec3::ZERO);
        assert!(stage.surfaces.is_empty());
    }

    #[test]
    fn missing_surface_name_is_an_error() {
        let bad = "<stage><surface><min>0 0 0</min><max>1 1 1</max></surface></stage>";
        assert!(Stage::from_xml(bad).is_err());
    }

    #[test]
    fn inverted_corners_are_rejected() {
        let bad = r#"<stage><surface>
            <name>broken</name>
            <min>5 0 0</min>
            <max>1 1 1</max>
        </surface></stage>"#;
        assert!(Stage::from_xml(bad).is_err());
    }

    #[test]
    fn unknown_elements_are_rejected() {
        assert!(Stage::from_xml("<stage><mystery/></stage>").is_err());
    }
}
