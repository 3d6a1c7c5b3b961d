//! Descriptions of the global resources nodes register while compiling.

use serde::{Deserialize, Serialize};

use crate::value::{ShaderValue, clean_name, fmt_f32};

pub const MAX_GRADIENT_KEYS: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerFilter {
    #[default]
    Aniso,
    Bilinear,
    Trilinear,
    Point,
}

impl SamplerFilter {
    pub fn hlsl(self) -> &'static str {
        match self {
            SamplerFilter::Aniso => "ANISO",
            SamplerFilter::Bilinear => "BILINEAR",
            SamplerFilter::Trilinear => "TRILINEAR",
            SamplerFilter::Point => "POINT",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureAddressMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
    Border,
    MirrorOnce,
}

impl TextureAddressMode {
    pub fn hlsl(self) -> &'static str {
        match self {
            TextureAddressMode::Wrap => "WRAP",
            TextureAddressMode::Mirror => "MIRROR",
            TextureAddressMode::Clamp => "CLAMP",
            TextureAddressMode::Border => "BORDER",
            TextureAddressMode::MirrorOnce => "MIRROR_ONCE",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerState {
    pub name: String,
    pub filter: SamplerFilter,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
}

impl SamplerState {
    pub fn declaration(&self, var: &str) -> String {
        format!(
            "SamplerState {var} < Filter( {} ); AddressU( {} ); AddressV( {} ); >;",
            self.filter.hlsl(),
            self.address_u.hlsl(),
            self.address_v.hlsl()
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureKind {
    #[default]
    Texture2D,
    TextureCube,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    #[default]
    Dxt5,
    Dxt1,
    Bc7,
    Rgba8888,
}

impl TextureFormat {
    pub fn hlsl(self) -> &'static str {
        match self {
            TextureFormat::Dxt5 => "DXT5",
            TextureFormat::Dxt1 => "DXT1",
            TextureFormat::Bc7 => "BC7",
            TextureFormat::Rgba8888 => "RGBA8888",
        }
    }
}

/// Material-editor facing description of a texture slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureInput {
    pub name: String,
    pub kind: TextureKind,
    pub image: String,
    pub default_color: [f32; 4],
    pub color_space: ColorSpace,
    pub format: TextureFormat,
    /// Suffix of the input file, e.g. `_color` or `_normal`.
    pub extension: String,
    pub group: String,
    pub priority: i32,
}

impl Default for TextureInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: TextureKind::Texture2D,
            image: String::new(),
            default_color: [1.0, 1.0, 1.0, 1.0],
            color_space: ColorSpace::Srgb,
            format: TextureFormat::Dxt5,
            extension: "_color".to_string(),
            group: String::new(),
            priority: 0,
        }
    }
}

impl TextureInput {
    pub fn srgb(&self) -> bool {
        self.color_space == ColorSpace::Srgb
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            TextureKind::Texture2D => "Texture2D",
            TextureKind::TextureCube => "TextureCube",
        }
    }

    fn create_input(&self) -> &'static str {
        match self.kind {
            TextureKind::Texture2D => "CreateInputTexture2D",
            TextureKind::TextureCube => "CreateInputTextureCube",
        }
    }

    /// Material-editor input declaration plus the channel-annotated texture global.
    pub fn declaration(&self, var: &str) -> String {
        let space = if self.srgb() { "Srgb" } else { "Linear" };
        let default = self
            .default_color
            .iter()
            .map(|v| format!("{v:.2}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}( {name}, {space}, 8, \"None\", \"{}\", \"{},{}/,0/0\", Default4( {default} ) );\n\
             {} {var} < Channel( RGBA, Box( {name} ), {space} ); OutputFormat( {} ); SrgbRead( {} ); >;",
            self.create_input(),
            self.extension,
            self.group,
            self.priority,
            self.type_name(),
            self.format.hlsl(),
            if self.srgb() { "True" } else { "False" },
            name = var.strip_prefix("g_t").unwrap_or(var),
        )
    }

    /// Runtime-bound form used by preview compiles.
    pub fn preview_declaration(&self, var: &str) -> String {
        format!(
            "{} {var} < Attribute( \"{var}\" ); SrgbRead( {} ); >;",
            self.type_name(),
            if self.srgb() { "True" } else { "False" }
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiType {
    #[default]
    Default,
    Slider,
    Color,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterUi {
    #[serde(rename = "type")]
    pub ui_type: UiType,
    pub group: String,
    pub priority: i32,
    pub step: f32,
}

/// A user-facing material parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ShaderValue,
    pub min: Option<ShaderValue>,
    pub max: Option<ShaderValue>,
    pub is_range: bool,
    pub is_attribute: bool,
    pub ui: ParameterUi,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: ShaderValue) -> Self {
        Self {
            name: name.into(),
            value,
            min: None,
            max: None,
            is_range: false,
            is_attribute: false,
            ui: ParameterUi::default(),
        }
    }

    /// `g_fl`, `g_v`, `g_b` or `g_m` followed by the cleaned name.
    pub fn variable_name(&self) -> String {
        format!("g_{}{}", self.value.prefix(), clean_name(&self.name))
    }

    /// Annotation block consumed by the material editor, e.g.
    /// `< UiGroup( ",0/,0/0" ); Default1( 0.5 ); Range1( 0.0, 1.0 ); >`.
    pub fn annotations(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.is_attribute {
            parts.push(format!("Attribute( \"{}\" );", clean_name(&self.name)));
        }
        match self.ui.ui_type {
            UiType::Default => {}
            UiType::Slider => parts.push("UiType( Slider );".to_string()),
            UiType::Color => parts.push("UiType( Color );".to_string()),
        }
        parts.push(format!(
            "UiGroup( \"{},{}/,0/0\" );",
            self.ui.group, self.ui.priority
        ));

        if let Ok(values) = self.value.components() {
            let n = values.len();
            let list = values.into_iter().map(fmt_f32).collect::<Vec<_>>().join(", ");
            parts.push(format!("Default{n}( {list} );"));
        }

        if self.is_range {
            if let (Some(min), Some(max)) = (self.min.as_ref(), self.max.as_ref()) {
                if let (Ok(lo), Ok(hi)) = (min.components(), max.components()) {
                    let n = lo.len();
                    let lo = lo.into_iter().map(fmt_f32).collect::<Vec<_>>().join(", ");
                    let hi = hi.into_iter().map(fmt_f32).collect::<Vec<_>>().join(", ");
                    parts.push(format!("Range{n}( {lo}, {hi} );"));
                }
            }
        }
        if self.ui.step > 0.0 {
            parts.push(format!("UiStep( {} );", fmt_f32(self.ui.step)));
        }

        format!("< {} >", parts.join(" "))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientColorKey {
    pub color: [f32; 4],
    pub time: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientAlphaKey {
    pub alpha: f32,
    pub time: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientBlend {
    #[default]
    Linear,
    Fixed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gradient {
    pub blend: GradientBlend,
    pub colors: Vec<GradientColorKey>,
    pub alphas: Vec<GradientAlphaKey>,
}

impl Gradient {
    /// Unrolled initialisation of a `Gradient` local.
    pub fn declaration(&self, var: &str) -> String {
        let mut out = format!("Gradient {var} = Gradient::Init();\n");
        out.push_str(&format!(
            "{var}.colorsLength = {};\n{var}.alphasLength = {};\n",
            self.colors.len(),
            self.alphas.len()
        ));
        if self.blend == GradientBlend::Fixed {
            out.push_str(&format!("{var}.type = 1;\n"));
        }
        for (i, key) in self.colors.iter().enumerate() {
            let [r, g, b, _] = key.color;
            out.push_str(&format!(
                "{var}.colors[{i}] = float4( {}, {}, {}, {} );\n",
                fmt_f32(r),
                fmt_f32(g),
                fmt_f32(b),
                fmt_f32(key.time)
            ));
        }
        for (i, key) in self.alphas.iter().enumerate() {
            out.push_str(&format!(
                "{var}.alphas[{i}] = float2( {}, {} );\n",
                fmt_f32(key.alpha),
                fmt_f32(key.time)
            ));
        }
        out
    }
}

/// A static feature toggled per compiled shader variant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub header: String,
    /// Enumerated option labels. Empty means a plain on/off feature.
    pub options: Vec<String>,
}

impl Feature {
    pub fn is_valid(&self) -> bool {
        !clean_name(&self.name).is_empty()
    }

    fn upper(&self) -> String {
        clean_name(&self.name).to_ascii_uppercase()
    }

    pub fn feature_symbol(&self) -> String {
        format!("F_{}", self.upper())
    }

    pub fn combo_symbol(&self) -> String {
        format!("S_{}", self.upper())
    }

    pub fn max_option(&self) -> usize {
        self.options.len().saturating_sub(1).max(1)
    }

    /// `Feature( ... );`, followed by the description as a line comment when there is one.
    pub fn declaration(&self) -> String {
        let labels = if self.options.is_empty() {
            String::new()
        } else {
            format!("({})", self.options.join(", "))
        };
        let mut line = format!(
            "Feature( {}, 0..{}{labels}, \"{}\" );",
            self.feature_symbol(),
            self.max_option(),
            self.header
        );
        let description = self.description.split_whitespace().collect::<Vec<_>>().join(" ");
        if !description.is_empty() {
            line.push_str(" // ");
            line.push_str(&description);
        }
        line
    }

    pub fn static_combo(&self) -> String {
        format!(
            "StaticCombo( {}, {}, Sys( ALL ) );",
            self.combo_symbol(),
            self.feature_symbol()
        )
    }
}
