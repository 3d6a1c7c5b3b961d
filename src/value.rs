//! Typed shader expressions produced while walking a graph.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::resources::SamplerState;

const COMPONENT_SELECTOR: &str = "xyzw";

/// Kind of value a [`NodeResult`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    Bool,
    Float,
    Vector2,
    Vector3,
    /// Four component vector; doubles as RGBA colour.
    Color,
    Float2x2,
    Float3x3,
    Float4x4,
    Sampler,
    Texture2D,
    TextureCube,
    Gradient,
    Void,
    Invalid,
}

impl ResultType {
    pub fn components(self) -> usize {
        match self {
            ResultType::Bool | ResultType::Float => 1,
            ResultType::Vector2 => 2,
            ResultType::Vector3 => 3,
            ResultType::Color | ResultType::Float2x2 => 4,
            ResultType::Float3x3 => 9,
            ResultType::Float4x4 => 16,
            ResultType::Sampler
            | ResultType::Texture2D
            | ResultType::TextureCube
            | ResultType::Gradient
            | ResultType::Void
            | ResultType::Invalid => 0,
        }
    }

    /// Vector kind for a lane count. Anything outside 1..=4 has no vector kind.
    pub fn from_components(components: usize) -> ResultType {
        match components {
            1 => ResultType::Float,
            2 => ResultType::Vector2,
            3 => ResultType::Vector3,
            4 => ResultType::Color,
            _ => ResultType::Invalid,
        }
    }

    pub fn is_castable(self) -> bool {
        matches!(
            self,
            ResultType::Bool
                | ResultType::Float
                | ResultType::Vector2
                | ResultType::Vector3
                | ResultType::Color
        )
    }

    pub fn is_matrix(self) -> bool {
        matches!(
            self,
            ResultType::Float2x2 | ResultType::Float3x3 | ResultType::Float4x4
        )
    }

    pub fn hlsl(self) -> Result<&'static str> {
        Ok(match self {
            ResultType::Bool => "bool",
            ResultType::Float => "float",
            ResultType::Vector2 => "float2",
            ResultType::Vector3 => "float3",
            ResultType::Color => "float4",
            ResultType::Float2x2 => "float2x2",
            ResultType::Float3x3 => "float3x3",
            ResultType::Float4x4 => "float4x4",
            ResultType::Sampler => "SamplerState",
            ResultType::Texture2D => "Texture2D",
            ResultType::TextureCube => "TextureCube",
            ResultType::Gradient => "Gradient",
            ResultType::Void | ResultType::Invalid => {
                return Err(GraphError::UnsupportedType(self));
            }
        })
    }
}

/// Which side of a static switch a value was produced for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchBranch {
    True,
    False,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchBinding {
    /// Static combo symbol of the feature, e.g. `S_TINT`.
    pub combo: String,
    pub branch: SwitchBranch,
}

impl SwitchBinding {
    pub fn new(combo: impl Into<String>, branch: SwitchBranch) -> Self {
        Self {
            combo: combo.into(),
            branch,
        }
    }
}

/// Side-channel data some results carry for later stages.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultMetadata {
    /// Source image of a texture, carried on to the samples taken from it.
    ImagePath(String),
}

/// One typed shader expression.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeResult {
    pub ty: ResultType,
    pub code: String,
    /// Inlined at every use instead of being promoted to a local.
    pub constant: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: Vec<ResultMetadata>,
}

impl Default for NodeResult {
    fn default() -> Self {
        Self {
            ty: ResultType::Invalid,
            code: String::new(),
            constant: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata: Vec::new(),
        }
    }
}

impl NodeResult {
    pub fn new(ty: ResultType, code: impl Into<String>) -> Self {
        Self {
            ty,
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn constant(ty: ResultType, code: impl Into<String>) -> Self {
        Self {
            constant: true,
            ..Self::new(ty, code)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::errors(vec![message.into()])
    }

    pub fn errors(messages: Vec<String>) -> Self {
        Self {
            errors: messages,
            ..Self::default()
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            warnings: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn missing_input(input: &str) -> Self {
        Self::error(format!("Missing input: {input}"))
    }

    pub fn with_metadata(mut self, metadata: ResultMetadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.ty != ResultType::Invalid && !self.code.trim().is_empty()
    }

    pub fn components(&self) -> usize {
        self.ty.components()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.metadata.iter().find_map(|m| match m {
            ResultMetadata::ImagePath(path) => Some(path.as_str()),
        })
    }

    /// Rewrites the expression so it has `target` components.
    ///
    /// - equal width: unchanged
    /// - wider source: leading component selector (`.xy`)
    /// - scalar source: replicated into every lane
    /// - narrower vector: padded with `default`
    pub fn cast(&self, target: usize, default: f32) -> Result<String> {
        if !self.ty.is_castable() {
            return Err(GraphError::NotCastable(self.ty, target));
        }
        if !(1..=4).contains(&target) {
            return Err(GraphError::CastTarget(target));
        }

        let components = self.components();
        if components == target {
            return Ok(self.code.clone());
        }
        if components > target {
            return Ok(format!("{}.{}", self.code, &COMPONENT_SELECTOR[..target]));
        }
        if components == 1 {
            let lanes = vec![self.code.as_str(); target].join(", ");
            return Ok(format!("float{target}( {lanes} )"));
        }

        let fill = vec![fmt_f32(default); target - components].join(", ");
        Ok(format!("float{target}( {}, {fill} )", self.code))
    }

    /// Cast into a new result of the vector kind for `target` lanes, keeping constancy.
    pub fn cast_result(&self, target: usize, default: f32) -> Result<NodeResult> {
        let code = self.cast(target, default)?;
        Ok(NodeResult {
            ty: ResultType::from_components(target),
            code,
            constant: self.constant,
            ..NodeResult::default()
        })
    }
}

/// Widen the narrower of two operands so both share a lane count.
///
/// Non-vector operands are returned untouched.
pub fn promote(a: NodeResult, b: NodeResult) -> Result<(NodeResult, NodeResult)> {
    if !a.ty.is_castable() || !b.ty.is_castable() || a.components() == b.components() {
        return Ok((a, b));
    }
    if a.components() < b.components() {
        let a = a.cast_result(b.components(), 0.0)?;
        Ok((a, b))
    } else {
        let b = b.cast_result(a.components(), 0.0)?;
        Ok((a, b))
    }
}

/// A literal that can be inlined or bound as a preview attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ShaderValue {
    Bool(bool),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Color([f32; 4]),
    Float2x2([f32; 4]),
    Float3x3([f32; 9]),
    Float4x4([f32; 16]),
    Sampler(SamplerState),
    /// Image path of a texture input.
    Texture(String),
}

impl ShaderValue {
    pub fn result_type(&self) -> ResultType {
        match self {
            ShaderValue::Bool(_) => ResultType::Bool,
            ShaderValue::Float(_) => ResultType::Float,
            ShaderValue::Float2(_) => ResultType::Vector2,
            ShaderValue::Float3(_) => ResultType::Vector3,
            ShaderValue::Float4(_) | ShaderValue::Color(_) => ResultType::Color,
            ShaderValue::Float2x2(_) => ResultType::Float2x2,
            ShaderValue::Float3x3(_) => ResultType::Float3x3,
            ShaderValue::Float4x4(_) => ResultType::Float4x4,
            ShaderValue::Sampler(_) => ResultType::Sampler,
            ShaderValue::Texture(_) => ResultType::Texture2D,
        }
    }

    /// Variable name prefix used for globals of this kind (`g_fl`, `g_v`, ...).
    pub fn prefix(&self) -> &'static str {
        match self {
            ShaderValue::Bool(_) => "b",
            ShaderValue::Float(_) => "fl",
            ShaderValue::Float2(_)
            | ShaderValue::Float3(_)
            | ShaderValue::Float4(_)
            | ShaderValue::Color(_) => "v",
            ShaderValue::Float2x2(_) | ShaderValue::Float3x3(_) | ShaderValue::Float4x4(_) => "m",
            ShaderValue::Sampler(_) => "s",
            ShaderValue::Texture(_) => "t",
        }
    }

    /// Raw lane values, row major for matrices.
    pub fn components(&self) -> Result<Vec<f32>> {
        Ok(match self {
            ShaderValue::Bool(v) => vec![if *v { 1.0 } else { 0.0 }],
            ShaderValue::Float(v) => vec![*v],
            ShaderValue::Float2(v) => v.to_vec(),
            ShaderValue::Float3(v) => v.to_vec(),
            ShaderValue::Float4(v) | ShaderValue::Color(v) | ShaderValue::Float2x2(v) => v.to_vec(),
            ShaderValue::Float3x3(v) => v.to_vec(),
            ShaderValue::Float4x4(v) => v.to_vec(),
            ShaderValue::Sampler(_) | ShaderValue::Texture(_) => {
                return Err(GraphError::UnsupportedValue(format!("{self:?}")));
            }
        })
    }

    /// Comma separated lane list without a constructor.
    pub fn component_list(&self) -> Result<String> {
        Ok(self
            .components()?
            .into_iter()
            .map(fmt_f32)
            .collect::<Vec<_>>()
            .join(", "))
    }

    /// Inline HLSL literal. Matrices yield only their component list; the emitter wraps
    /// the constructor when declaring the local.
    pub fn literal(&self) -> Result<String> {
        Ok(match self {
            ShaderValue::Bool(v) => v.to_string(),
            ShaderValue::Float(v) => fmt_f32(*v),
            ShaderValue::Float2(_) | ShaderValue::Float3(_) | ShaderValue::Float4(_) | ShaderValue::Color(_) => {
                let ty = self.result_type().hlsl()?;
                format!("{ty}( {} )", self.component_list()?)
            }
            ShaderValue::Float2x2(_) | ShaderValue::Float3x3(_) | ShaderValue::Float4x4(_) => {
                self.component_list()?
            }
            ShaderValue::Sampler(_) | ShaderValue::Texture(_) => {
                return Err(GraphError::UnsupportedValue(format!("{self:?}")));
            }
        })
    }
}

/// Format a float for HLSL: shortest round-trip text that always keeps a decimal point.
pub fn fmt_f32(v: f32) -> String {
    if v.is_finite() {
        format!("{v:?}")
    } else {
        "0.0".to_string()
    }
}

/// Strip a user supplied name down to a valid identifier.
pub fn clean_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else if !ch.is_whitespace() {
            out.push('_');
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
