//! End-to-end tests for ARB to GLSL translation

use gs_arb::{convert_arb, translate, ArbTranslator};
use gs_core::{ArbError, LimitOverrides, Locator, ProgramKind, TranslatorConfig};

const TRANSFORM_VP: &str = "!!ARBvp1.0
# simple transform
ATTRIB pos = vertex.position;
PARAM mvp[4] = { state.matrix.mvp };
TEMP r0;
DP4 r0.x, mvp[0], pos;
DP4 r0.y, mvp[1], pos;
DP4 r0.z, mvp[2], pos;
DP4 r0.w, mvp[3], pos;
MOV result.position, r0;
MOV result.color, vertex.color;
END
";

#[test]
fn test_empty_programs() {
    let fp = translate("!!ARBfp1.0\nEND\n", ProgramKind::Fragment).unwrap();
    assert!(fp.starts_with("#version 120"));
    assert_eq!(fp.matches("void main() {\n}\n").count(), 1);
    assert!(!fp.contains("ARBAddress"));

    let vp = translate("!!ARBvp1.0\nEND\n", ProgramKind::Vertex).unwrap();
    assert!(vp.starts_with("#version 120"));
    assert!(vp.contains("struct ARBAddress { int x; };"));
}

#[test]
fn test_header_errors() {
    let err = translate("garbage", ProgramKind::Fragment).unwrap_err();
    assert_eq!(err, ArbError::HeaderMissing);
    assert_eq!(err.locator(), Locator::Offset(0));

    let err = translate("!!ARBvp1.0\nEND\n", ProgramKind::Fragment).unwrap_err();
    assert!(matches!(err, ArbError::HeaderMismatch { .. }));
    assert!(err.to_string().contains("mismatch"));
    assert_eq!(err.locator(), Locator::Offset(0));
}

#[test]
fn test_legacy_entry_point() {
    let mut msg = None;
    let mut loc = 0;

    let out = convert_arb("!!ARBvp1.0\nEND\n", false, &mut msg, &mut loc);
    assert!(out.is_none());
    assert_eq!(loc, 0);
    assert!(msg.as_deref().unwrap_or_default().contains("mismatch"));

    let out = convert_arb("!!ARBfp1.0\nTEMP r;\nFOO r;\nEND\n", false, &mut msg, &mut loc);
    assert!(out.is_none());
    assert_eq!(loc, 19);
    assert!(msg.as_deref().unwrap_or_default().contains("FOO"));

    let out = convert_arb("!!ARBfp1.0\nEND\n", false, &mut msg, &mut loc);
    assert!(out.is_some());
    assert_eq!(loc, -1);
}

#[test]
fn test_transform_program() {
    let glsl = translate(TRANSFORM_VP, ProgramKind::Vertex).unwrap();
    assert!(glsl.contains(
        "vec4 arb_umvp[4] = vec4[4](gl_ModelViewProjectionMatrixTranspose[0], \
         gl_ModelViewProjectionMatrixTranspose[1], gl_ModelViewProjectionMatrixTranspose[2], \
         gl_ModelViewProjectionMatrixTranspose[3]);"
    ));
    assert!(glsl.contains("arb_ur0.x = (vec4(dot(arb_umvp[0], gl_Vertex))).x;"));
    assert!(glsl.contains("gl_Position = arb_ur0;"));
    assert!(glsl.contains("gl_FrontColor = gl_Color;"));
}

#[test]
fn test_declarations_precede_instructions() {
    let glsl = translate(TRANSFORM_VP, ProgramKind::Vertex).unwrap();
    let decl = glsl.find("vec4 arb_ur0 = vec4(0.0);").unwrap();
    let mvp = glsl.find("vec4 arb_umvp[4]").unwrap();
    let first = glsl.find("arb_ur0.x =").unwrap();
    assert!(mvp < decl);
    assert!(decl < first);
}

#[test]
fn test_output_is_deterministic() {
    let a = translate(TRANSFORM_VP, ProgramKind::Vertex).unwrap();
    let b = translate(TRANSFORM_VP, ProgramKind::Vertex).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_position_invariant() {
    let src = "!!ARBvp1.0\nOPTION ARB_position_invariant;\nMOV result.color, vertex.color;\nEND\n";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    assert!(glsl.ends_with("    gl_Position = ftransform();\n}\n"));
}

#[test]
fn test_fog_coordinate_shadow() {
    let src = "!!ARBvp1.0\nMOV result.fogcoord, vertex.fogcoord;\nEND\n";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    assert!(glsl.contains("vec4 arb_FogFragCoord = vec4(0.0, 0.0, 0.0, 1.0);"));
    assert!(glsl.contains("arb_FogFragCoord = vec4(gl_FogCoord, 0.0, 0.0, 1.0);"));
    assert!(glsl.contains("gl_FogFragCoord = arb_FogFragCoord.x;"));
}

#[test]
fn test_depth_replacement_and_fog() {
    let src = "!!ARBfp1.0
OPTION ARB_fog_exp;
TEMP r;
MOV r, fragment.color;
MOV result.color, r;
MOV result.depth.z, fragment.position;
END
";
    let glsl = translate(src, ProgramKind::Fragment).unwrap();
    assert!(glsl.contains("vec4 arb_FragDepth = vec4(gl_FragCoord.z);"));
    assert!(glsl.contains("arb_FragDepth.z = (gl_FragCoord).z;"));
    let depth = glsl.find("gl_FragDepth = arb_FragDepth.z;").unwrap();
    let fog = glsl
        .find("gl_FragColor.rgb = mix(gl_Fog.color.rgb, gl_FragColor.rgb, clamp(exp(-gl_Fog.density * gl_FogFragCoord), 0.0, 1.0));")
        .unwrap();
    assert!(depth < fog);
    assert_eq!(glsl.matches("gl_Fog.color.rgb").count(), 1);
}

#[test]
fn test_texture_sampling() {
    let src = "!!ARBfp1.0
TEMP c;
TEX c, fragment.texcoord[0], texture[0], 2D;
TXP c, fragment.texcoord[1], texture[1], RECT;
MUL_SAT result.color, c, fragment.color;
END
";
    let glsl = translate(src, ProgramKind::Fragment).unwrap();
    assert!(glsl.contains("#extension GL_ARB_texture_rectangle : enable"));
    assert!(glsl.contains("uniform sampler2D arb_tex0;"));
    assert!(glsl.contains("uniform sampler2DRect arb_tex1;"));
    assert!(glsl.contains("arb_uc = texture2D(arb_tex0, gl_TexCoord[0].xy);"));
    assert!(glsl.contains("arb_uc = texture2DRectProj(arb_tex1, gl_TexCoord[1]);"));
    assert!(glsl.contains("gl_FragColor = clamp((arb_uc * gl_Color), 0.0, 1.0);"));
}

#[test]
fn test_txb_on_rect_reports_instruction_offset() {
    let src = "!!ARBfp1.0\nTEMP c;\nTXB c, c, texture[0], RECT;\nEND\n";
    let err = translate(src, ProgramKind::Fragment).unwrap_err();
    assert!(matches!(err, ArbError::Generation { .. }));
    assert_eq!(err.locator(), Locator::Offset(19));
}

#[test]
fn test_relative_addressing() {
    let src = "!!ARBvp1.0
ADDRESS a0;
PARAM c[] = { program.env[0..3] };
TEMP r;
ARL a0.x, vertex.attrib[8].x;
MOV r, c[a0.x + 2];
MOV result.position, r;
END
";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    assert!(glsl.contains("ARBAddress arb_ua0 = ARBAddress(0);"));
    assert!(glsl.contains(
        "vec4 arb_uc[4] = vec4[4](arb_vp_env[0], arb_vp_env[1], arb_vp_env[2], arb_vp_env[3]);"
    ));
    assert!(glsl.contains("arb_ua0.x = int(floor(gl_MultiTexCoord0.x));"));
    assert!(glsl.contains("arb_ur = arb_uc[arb_ua0.x + 2];"));
}

#[test]
fn test_implicit_bindings() {
    let src = "!!ARBvp1.0
MOV result.position, vertex.position;
ADD result.texcoord[1], program.local[3], state.fog.color;
END
";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    assert!(glsl.contains("gl_Position = gl_Vertex;"));
    assert!(glsl.contains("vec4 arb_implicit3 = arb_vp_local[3];"));
    assert!(glsl.contains("vec4 arb_implicit4 = gl_Fog.color;"));
    assert!(glsl.contains("gl_TexCoord[1] = (arb_implicit3 + arb_implicit4);"));
}

#[test]
fn test_point_size_finalization() {
    let src = "!!ARBvp1.0
OUTPUT psz = result.pointsize;
MOV psz, state.point.size;
MOV result.position, vertex.position;
END
";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    assert!(glsl.contains("vec4 arb_upsz = vec4(0.0);"));
    let write = glsl.find("arb_upsz = arb_implicit1;").unwrap();
    let finalize = glsl.find("gl_PointSize = arb_upsz.x;").unwrap();
    assert!(write < finalize);
}

#[test]
fn test_scalar_and_swizzle_ops() {
    let src = "!!ARBfp1.0
TEMP r;
RSQ r.x, fragment.texcoord[0].w;
SWZ r, fragment.color, -x, 1, 0, w;
LRP r, r, fragment.color, fragment.texcoord[0];
CMP result.color, -r, r, fragment.color;
KIL r;
END
";
    let glsl = translate(src, ProgramKind::Fragment).unwrap();
    assert!(glsl.contains("arb_ur.x = (vec4(inversesqrt(abs(gl_TexCoord[0].w)))).x;"));
    assert!(glsl.contains("arb_ur = vec4(-gl_Color.x, 1.0, 0.0, gl_Color.w);"));
    assert!(glsl.contains("arb_ur = mix(gl_TexCoord[0], gl_Color, arb_ur);"));
    assert!(glsl.contains(
        "gl_FragColor = mix(gl_Color, arb_ur, vec4(lessThan((-arb_ur), vec4(0.0))));"
    ));
    assert!(glsl.contains("if (any(lessThan(arb_ur, vec4(0.0)))) discard;"));
}

#[test]
fn test_syntax_error_offsets() {
    let cases: &[(&str, ProgramKind, usize)] = &[
        ("!!ARBvp1.0\nTEMP a;\nTEMP a;\nEND\n", ProgramKind::Vertex, 24),
        ("!!ARBvp1.0\nMOV result.position, x;\nEND\n", ProgramKind::Vertex, 32),
        ("!!ARBvp1.0\nADD r;\nEND\n", ProgramKind::Vertex, 15),
        ("!!ARBfp1.0\nADDRESS a;\nEND\n", ProgramKind::Fragment, 11),
        ("!!ARBfp1.0\nMOV result.color, fragment.texcoord[8];\nEND\n", ProgramKind::Fragment, 47),
    ];

    for (source, kind, offset) in cases {
        let err = translate(source, *kind).unwrap_err();
        assert!(
            matches!(err, ArbError::Syntax { .. }),
            "{:?} for {:?}",
            err,
            source
        );
        assert_eq!(err.locator(), Locator::Offset(*offset), "{}", source);
    }
}

#[test]
fn test_configured_limits() {
    let mut config = TranslatorConfig::default();
    config.fragment = LimitOverrides {
        max_instructions: Some(1),
        ..LimitOverrides::default()
    };
    let translator = ArbTranslator::new(config);

    let src = "!!ARBfp1.0\nMOV result.color, fragment.color;\nMOV result.color, fragment.color;\nEND\n";
    let err = translator.translate(src, ProgramKind::Fragment).unwrap_err();
    assert!(err.to_string().contains("too many instructions"));

    // Vertex limits are unaffected
    let vp = "!!ARBvp1.0\nMOV result.color, vertex.color;\nMOV result.position, vertex.position;\nEND\n";
    assert!(translator.translate(vp, ProgramKind::Vertex).is_ok());
}

#[test]
fn test_instruction_order_is_preserved() {
    let src = "!!ARBfp1.0
TEMP a, b;
MOV a, fragment.color;
ADD b, a, fragment.texcoord[0];
MUL a, b, a;
SUB b, a, b;
MOV result.color, b;
END
";
    let glsl = translate(src, ProgramKind::Fragment).unwrap();
    let expected = [
        "    arb_ua = gl_Color;\n",
        "    arb_ub = (arb_ua + gl_TexCoord[0]);\n",
        "    arb_ua = (arb_ub * arb_ua);\n",
        "    arb_ub = (arb_ua - arb_ub);\n",
        "    gl_FragColor = arb_ub;\n",
    ];

    let positions: Vec<usize> = expected
        .iter()
        .map(|line| glsl.find(line).unwrap_or_else(|| panic!("missing {:?}", line)))
        .collect();
    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1], "{:?}", positions);
    }
}

#[test]
fn test_fog_law_selection() {
    let laws = [
        ("ARB_fog_exp", "exp(-gl_Fog.density * gl_FogFragCoord)"),
        (
            "ARB_fog_exp2",
            "exp(-(gl_Fog.density * gl_FogFragCoord) * (gl_Fog.density * gl_FogFragCoord))",
        ),
        ("ARB_fog_linear", "(gl_Fog.end - gl_FogFragCoord) * gl_Fog.scale"),
    ];

    for (option, factor) in laws {
        let src = format!(
            "!!ARBfp1.0\nOPTION {};\nMOV result.color, fragment.color;\nEND\n",
            option
        );
        let glsl = translate(&src, ProgramKind::Fragment).unwrap();

        let blend = format!(
            "gl_FragColor.rgb = mix(gl_Fog.color.rgb, gl_FragColor.rgb, clamp({}, 0.0, 1.0));",
            factor
        );
        assert!(glsl.contains(&blend), "{}: {}", option, glsl);
        assert_eq!(glsl.matches("gl_FragColor.rgb = mix(").count(), 1, "{}", option);

        for (other, other_factor) in laws {
            if other != option {
                assert!(!glsl.contains(&format!("clamp({}, 0.0, 1.0)", other_factor)), "{}", option);
            }
        }
    }

    let plain = translate("!!ARBfp1.0\nMOV result.color, fragment.color;\nEND\n", ProgramKind::Fragment)
        .unwrap();
    assert!(!plain.contains("gl_Fog"));
}

#[test]
fn test_temp_named_like_sampler() {
    let src = "!!ARBfp1.0
TEMP tex0;
TEX tex0, fragment.texcoord[0], texture[0], 2D;
MOV result.color, tex0;
END
";
    let glsl = translate(src, ProgramKind::Fragment).unwrap();
    assert_eq!(glsl.matches("arb_tex0;").count(), 1);
    assert!(glsl.contains("uniform sampler2D arb_tex0;"));
    assert!(glsl.contains("vec4 arb_utex0 = vec4(0.0);"));
    assert!(glsl.contains("arb_utex0 = texture2D(arb_tex0, gl_TexCoord[0].xy);"));
    assert!(glsl.contains("gl_FragColor = arb_utex0;"));
}

#[test]
fn test_temp_named_like_depth_shadow() {
    let src = "!!ARBfp1.0
TEMP FragDepth;
MOV FragDepth, fragment.position;
MOV result.depth.z, FragDepth;
END
";
    let glsl = translate(src, ProgramKind::Fragment).unwrap();
    assert_eq!(glsl.matches("vec4 arb_FragDepth =").count(), 1);
    assert!(glsl.contains("vec4 arb_uFragDepth = vec4(0.0);"));
    assert!(glsl.contains("arb_FragDepth.z = (arb_uFragDepth).z;"));
}

#[test]
fn test_temp_named_like_implicit_variable() {
    let src = "!!ARBvp1.0
TEMP implicit1;
MOV implicit1, state.fog.color;
MOV result.position, implicit1;
END
";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    assert_eq!(glsl.matches("vec4 arb_implicit1 =").count(), 1);
    assert!(glsl.contains("vec4 arb_implicit1 = gl_Fog.color;"));
    assert!(glsl.contains("vec4 arb_uimplicit1 = vec4(0.0);"));
    assert!(glsl.contains("arb_uimplicit1 = arb_implicit1;"));
    assert!(glsl.contains("gl_Position = arb_uimplicit1;"));
}

#[test]
fn test_dollar_and_underscore_names_stay_distinct() {
    let src = "!!ARBvp1.0
TEMP a$b, a_S_b, a_db, _x;
MOV a$b, vertex.color;
MOV a_S_b, a$b;
MOV a_db, a_S_b;
MOV _x, a_db;
MOV result.color, _x;
END
";
    let glsl = translate(src, ProgramKind::Vertex).unwrap();
    for decl in [
        "vec4 arb_ua_db = vec4(0.0);",
        "vec4 arb_ua_uS_ub = vec4(0.0);",
        "vec4 arb_ua_udb = vec4(0.0);",
        "vec4 arb_u_ux = vec4(0.0);",
    ] {
        assert_eq!(glsl.matches(decl).count(), 1, "{}", decl);
    }
    assert!(glsl.contains("arb_ua_uS_ub = arb_ua_db;"));
    assert!(glsl.contains("gl_FrontColor = arb_u_ux;"));
    assert!(!glsl.contains("__"));
}
