//! Stage templates the emitted fragments are substituted into.
//!
//! Placeholders are `{{name}}` tokens. Every token except `description` sits alone at
//! the start of its line; the emitter indents the substituted text itself.

use crate::graph::{ShaderDomain, ShaderGraph, ShadingModel};

/// Placeholder names, in fragment order, with their tab depth.
pub const PLACEHOLDERS: [(&str, usize); 13] = [
    ("description", 0),
    ("features", 1),
    ("defines", 1),
    ("vertex_combos", 1),
    ("vertex_globals", 1),
    ("vertex_functions", 1),
    ("vertex_locals", 2),
    ("vertex_assignments", 2),
    ("pixel_combos", 1),
    ("pixel_globals", 1),
    ("pixel_functions", 1),
    ("pixel_locals", 2),
    ("pixel_assignments", 2),
];

const SURFACE: &str = r#"HEADER
{
	Description = "{{description}}";
}

FEATURES
{
	#include "common/features.hlsl"
{{features}}
}

MODES
{
	Forward();
	Depth();
	ToolsShadingComplexity( "tools_shading_complexity.shader" );
}

COMMON
{
{{defines}}
	#include "common/shared.hlsl"
	#include "procedural.hlsl"

	#define S_UV2 1
	#define CUSTOM_MATERIAL_INPUTS
}

struct VertexInput
{
	#include "common/vertexinput.hlsl"
	float4 vColor : COLOR0 < Semantic( Color ); >;
};

struct PixelInput
{
	#include "common/pixelinput.hlsl"
	float3 vPositionOs : TEXCOORD14;
	float3 vNormalOs : TEXCOORD15;
	float4 vTangentUOs_flTangentVSign : TANGENT < Semantic( TangentU_SignV ); >;
	float4 vColor : COLOR0;
	float4 vTintColor : COLOR1;
};

VS
{
	#include "common/vertex.hlsl"

{{vertex_combos}}
{{vertex_globals}}
{{vertex_functions}}

	PixelInput MainVs( VertexInput v )
	{
		PixelInput i = ProcessVertex( v );
		i.vPositionOs = v.vPositionOs.xyz;
		i.vColor = v.vColor;

		VS_DecodeObjectSpaceNormalAndTangent( v, i.vNormalOs, i.vTangentUOs_flTangentVSign );

{{vertex_locals}}
{{vertex_assignments}}
		i.vPositionPs.xyzw = Position3WsToPs( i.vPositionWs.xyz );

		return FinalizeVertex( i );
	}
}

PS
{
	#include "common/pixel.hlsl"

{{pixel_combos}}
{{pixel_globals}}
{{pixel_functions}}

	float4 MainPs( PixelInput i ) : SV_Target0
	{
		Material m = Material::Init();
		m.Albedo = float3( 1, 1, 1 );
		m.Normal = float3( 0, 0, 1 );
		m.Roughness = 1;
		m.Metalness = 0;
		m.AmbientOcclusion = 1;
		m.TintMask = 1;
		m.Opacity = 1;
		m.Emission = float3( 0, 0, 0 );
		m.Transmission = 0;

{{pixel_locals}}
{{pixel_assignments}}

		m.AmbientOcclusion = saturate( m.AmbientOcclusion );
		m.Roughness = saturate( m.Roughness );
		m.Metalness = saturate( m.Metalness );
		m.Opacity = saturate( m.Opacity );

		__SHADE__
	}
}
"#;

const LIT_SHADE: &str = "return ShadingModelStandard::Shade( i, m );";

const UNLIT_SHADE: &str = "return float4( m.Albedo + m.Emission, m.Opacity );";

const POST_PROCESS: &str = r#"HEADER
{
	Description = "{{description}}";
	DevShader = true;
}

MODES
{
	Default();
	Forward();
}

FEATURES
{
{{features}}
}

COMMON
{
{{defines}}
	#include "postprocess/shared.hlsl"
}

struct VertexInput
{
	float3 vPositionOs : POSITION < Semantic( PosXyz ); >;
	float2 vTexCoord : TEXCOORD0 < Semantic( LowPrecisionUv ); >;
};

struct PixelInput
{
	float2 vTexCoord : TEXCOORD0;

	#if ( PROGRAM == VFX_PROGRAM_VS )
		float4 vPositionPs : SV_Position;
	#endif

	#if ( PROGRAM == VFX_PROGRAM_PS )
		float4 vPositionSs : SV_Position;
	#endif
};

VS
{
{{vertex_combos}}
{{vertex_globals}}
{{vertex_functions}}

	PixelInput MainVs( VertexInput v )
	{
		PixelInput i;
		i.vPositionPs = float4( v.vPositionOs.xy, 0.0f, 1.0f );
		i.vTexCoord = v.vTexCoord;

{{vertex_locals}}
{{vertex_assignments}}

		return i;
	}
}

PS
{
	#include "postprocess/common.hlsl"

	RenderState( DepthWriteEnable, false );
	RenderState( DepthEnable, false );

	Texture2D g_tColorBuffer < Attribute( "ColorBuffer" ); SrgbRead( true ); >;
	SamplerState g_sColorSampler < Filter( BILINEAR ); AddressU( CLAMP ); AddressV( CLAMP ); >;

{{pixel_combos}}
{{pixel_globals}}
{{pixel_functions}}

	float4 MainPs( PixelInput i ) : SV_Target0
	{
		float4 color = g_tColorBuffer.Sample( g_sColorSampler, i.vTexCoord.xy );

{{pixel_locals}}
{{pixel_assignments}}

		return color;
	}
}
"#;

/// Template for a graph's domain and shading model.
pub fn template_for(graph: &ShaderGraph) -> String {
    match graph.domain {
        ShaderDomain::PostProcess => POST_PROCESS.to_string(),
        ShaderDomain::Surface => {
            let shade = match graph.shading_model {
                ShadingModel::Lit => LIT_SHADE,
                ShadingModel::Unlit => UNLIT_SHADE,
            };
            SURFACE.replace("__SHADE__", shade)
        }
    }
}
