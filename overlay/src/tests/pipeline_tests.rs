use common::setup_logging;
use glam::Vec2;

use crate::camera::CameraState;
use crate::color::Color;
use crate::controller::OverlayController;
use crate::device::PipelineKind;
use crate::frame::CIRCLE_SEGMENTS;
use crate::geometry::Rect;
use crate::scene::{
    AnnotationId, Centroid, ClassPalette, Contour, OverrideMap, Roi, SceneSnapshot,
};
use crate::software::{DrawCall, SoftwareDevice};
use crate::style::{BASE_ALPHA, HIGHLIGHT_ALPHA, HIGHLIGHT_COLOR, UNCLASSIFIED_COLOR};

fn three_centroid_scene() -> SceneSnapshot {
    SceneSnapshot {
        centroids: vec![
            Centroid {
                id: AnnotationId::from_u128(1),
                position: Vec2::new(10.0, 10.0),
                class_id: 0,
            },
            Centroid {
                id: AnnotationId::from_u128(2),
                position: Vec2::new(50.0, 50.0),
                class_id: 1,
            },
            Centroid {
                id: AnnotationId::from_u128(3),
                position: Vec2::new(90.0, 90.0),
                class_id: -1,
            },
        ],
        contours: vec![Contour {
            id: AnnotationId::from_u128(4),
            points: vec![
                Vec2::new(40.0, 40.0),
                Vec2::new(60.0, 40.0),
                Vec2::new(60.0, 60.0),
                Vec2::new(40.0, 60.0),
            ],
            class_id: 0,
        }],
        palette: ClassPalette::new(vec![Color::RED, Color::BLUE]),
        overrides: OverrideMap::new(),
        roi: None,
    }
}

fn instance_colors(controller: &OverlayController<SoftwareDevice>) -> Vec<[f32; 4]> {
    controller
        .frame_buffers()
        .instances
        .iter()
        .map(|i| i.color)
        .collect()
}

#[test]
fn full_pipeline_against_software_device() -> anyhow::Result<()> {
    setup_logging("debug");

    let mut controller = OverlayController::new(SoftwareDevice::new())?;
    let camera = CameraState::home(Vec2::new(1000.0, 1000.0), Vec2::new(800.0, 800.0));

    // data first, then the first camera snapshot
    controller.on_data_changed(&three_centroid_scene())?;
    controller.on_camera_changed(camera)?;

    // no ROI: palette colors at base alpha, unclassified falls back to gray
    assert_eq!(
        instance_colors(&controller),
        vec![
            Color::RED.with_alpha(BASE_ALPHA).to_array(),
            Color::BLUE.with_alpha(BASE_ALPHA).to_array(),
            UNCLASSIFIED_COLOR.with_alpha(BASE_ALPHA).to_array(),
        ]
    );

    let frame = controller.device().last_frame().unwrap().to_vec();
    assert_eq!(frame.len(), 2, "centroid + fill pass, no outline");
    assert!(matches!(
        frame[0],
        DrawCall::Instanced {
            pipeline: PipelineKind::CentroidInstanced,
            vertex_count,
            instance_count: 3,
            ..
        } if vertex_count == CIRCLE_SEGMENTS * 3
    ));
    assert!(matches!(
        frame[1],
        DrawCall::Indexed {
            pipeline: PipelineKind::PolygonFill,
            index_count: 6,
            ..
        }
    ));

    // drawing an ROI over the lower-left corner recolors what it contains
    let mut scene = three_centroid_scene();
    scene.roi = Some(Roi::Rect(Rect::from_corners(
        Vec2::ZERO,
        Vec2::new(60.0, 60.0),
    )));
    controller.on_data_changed(&scene)?;

    let highlight = HIGHLIGHT_COLOR.with_alpha(HIGHLIGHT_ALPHA).to_array();
    assert_eq!(
        instance_colors(&controller),
        vec![
            highlight,
            highlight,
            UNCLASSIFIED_COLOR.with_alpha(BASE_ALPHA).to_array(),
        ]
    );

    // the contour centroid (50,50) is inside, so the outline pass appears
    let frame = controller.device().last_frame().unwrap();
    assert_eq!(frame.len(), 3);
    assert!(matches!(
        frame[2],
        DrawCall::Lines {
            pipeline: PipelineKind::PolygonOutline,
            vertex_count: 8,
            ..
        }
    ));

    // clearing the ROI restores palette colors
    controller.on_data_changed(&three_centroid_scene())?;
    assert_eq!(
        instance_colors(&controller),
        vec![
            Color::RED.with_alpha(BASE_ALPHA).to_array(),
            Color::BLUE.with_alpha(BASE_ALPHA).to_array(),
            UNCLASSIFIED_COLOR.with_alpha(BASE_ALPHA).to_array(),
        ]
    );
    Ok(())
}

#[test]
fn camera_change_redraws_without_reupload() -> anyhow::Result<()> {
    let mut controller = OverlayController::new(SoftwareDevice::new())?;
    let content = Vec2::new(1000.0, 1000.0);
    let container = Vec2::new(800.0, 800.0);

    controller.on_data_changed(&three_centroid_scene())?;
    controller.on_camera_changed(CameraState::home(content, container))?;

    let uploaded: Vec<u8> = controller
        .device()
        .buffer_bytes(crate::device::BufferHandle(4))
        .unwrap()
        .to_vec();

    let mut zoomed = CameraState::home(content, container);
    zoomed.zoom = 4.0;
    controller.on_camera_changed(zoomed)?;

    // a pure camera move adds a frame but leaves the uploads untouched
    assert_eq!(controller.device().frames.len(), 2);
    assert_eq!(
        controller
            .device()
            .buffer_bytes(crate::device::BufferHandle(4))
            .unwrap(),
        &uploaded[..]
    );

    // zooming in grew the points
    let size_of = |frame: &[DrawCall]| match frame[0] {
        DrawCall::Instanced { uniforms, .. } => uniforms.point_size,
        _ => panic!("expected the centroid pass first"),
    };
    let frames = &controller.device().frames;
    assert!(size_of(&frames[1]) > size_of(&frames[0]));
    Ok(())
}

#[test]
fn degenerate_camera_skips_the_frame() -> anyhow::Result<()> {
    let mut controller = OverlayController::new(SoftwareDevice::new())?;
    controller.on_data_changed(&three_centroid_scene())?;

    let frames_before = controller.device().frames.len();
    let camera = CameraState::home(Vec2::ZERO, Vec2::new(800.0, 800.0));
    controller.on_camera_changed(camera)?;
    assert_eq!(controller.device().frames.len(), frames_before);
    Ok(())
}

#[test]
fn empty_scene_renders_an_empty_frame() -> anyhow::Result<()> {
    let mut controller = OverlayController::new(SoftwareDevice::new())?;
    controller.on_camera_changed(CameraState::home(
        Vec2::new(1000.0, 1000.0),
        Vec2::new(800.0, 800.0),
    ))?;
    controller.on_data_changed(&SceneSnapshot::default())?;

    assert_eq!(controller.device().last_frame(), Some(&[][..]));
    Ok(())
}

#[test]
fn setup_allocates_three_pipelines_and_five_buffers() -> anyhow::Result<()> {
    let controller = OverlayController::new(SoftwareDevice::new())?;
    assert_eq!(controller.device().buffer_count(), 5);
    assert_eq!(controller.device().pipeline_count(), 3);
    Ok(())
}
