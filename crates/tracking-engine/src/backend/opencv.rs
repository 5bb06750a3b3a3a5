//! OpenCV video source and ArUco detector.

use std::path::Path;

use opencv::core::{Mat, Point2f, Vector};
use opencv::imgproc;
use opencv::objdetect::{
    self, ArucoDetector, ArucoDetectorTraitConst, DetectorParameters, PredefinedDictionaryType,
    RefineParameters,
};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst};

use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::dictionary::{DictionaryPopulation, MarkerDictionary, MarkerGrid};
use marktrack_model::geometry::Point2;
use marktrack_model::sample::MarkerDetection;

use crate::source::{accept_marker_id, FrameSource, MarkerDetector};

/// Decodes a video file frame by frame.
pub struct VideoFileSource {
    cap: VideoCapture,
    fps: f64,
    name: String,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> MarktrackResult<Self> {
        let path_str = path.to_str().ok_or_else(|| {
            MarktrackError::source_unavailable(format!("non UTF-8 path: {}", path.display()))
        })?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .map_err(|e| MarktrackError::source_unavailable(e.to_string()))?;
        if !cap
            .is_opened()
            .map_err(|e| MarktrackError::source_unavailable(e.to_string()))?
        {
            return Err(MarktrackError::source_unavailable(format!(
                "cannot open video {}",
                path.display()
            )));
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)
            .map_err(|e| MarktrackError::source_unavailable(e.to_string()))?;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let height =
            VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        tracing::info!(
            path = %path.display(),
            fps,
            width = width as i64,
            height = height as i64,
            "Video opened"
        );

        Ok(Self {
            cap,
            fps,
            name: path.display().to_string(),
        })
    }
}

impl FrameSource for VideoFileSource {
    type Frame = Mat;

    fn frames_per_second(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self) -> MarktrackResult<Option<Mat>> {
        let mut frame = Mat::default();
        let ok = VideoCaptureTrait::read(&mut self.cap, &mut frame)
            .map_err(|e| MarktrackError::stream_read(e.to_string()))?;
        if !ok || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// ArUco detection on grayscale frames.
pub struct ArucoMarkerDetector {
    detector: ArucoDetector,
    gray: Mat,
}

impl ArucoMarkerDetector {
    pub fn new(dictionary: MarkerDictionary) -> MarktrackResult<Self> {
        let dict = objdetect::get_predefined_dictionary(predefined_type(dictionary))
            .map_err(|e| MarktrackError::detection(e.to_string()))?;
        let params =
            DetectorParameters::default().map_err(|e| MarktrackError::detection(e.to_string()))?;
        let refine = RefineParameters::new(10.0, 3.0, true)
            .map_err(|e| MarktrackError::detection(e.to_string()))?;
        let detector = ArucoDetector::new(&dict, &params, refine)
            .map_err(|e| MarktrackError::detection(e.to_string()))?;

        tracing::debug!(%dictionary, "ArUco detector ready");
        Ok(Self {
            detector,
            gray: Mat::default(),
        })
    }
}

impl MarkerDetector<Mat> for ArucoMarkerDetector {
    fn detect(&mut self, frame: &Mat) -> MarktrackResult<Vec<MarkerDetection>> {
        imgproc::cvt_color(frame, &mut self.gray, imgproc::COLOR_BGR2GRAY, 0)
            .map_err(|e| MarktrackError::detection(e.to_string()))?;

        let mut corners: Vector<Vector<Point2f>> = Vector::new();
        let mut ids: Vector<i32> = Vector::new();
        let mut rejected: Vector<Vector<Point2f>> = Vector::new();
        self.detector
            .detect_markers(&self.gray, &mut corners, &mut ids, &mut rejected)
            .map_err(|e| MarktrackError::detection(e.to_string()))?;

        let mut detections = Vec::with_capacity(ids.len());
        for (raw_id, quad) in ids.iter().zip(corners.iter()) {
            let Some(id) = accept_marker_id(i64::from(raw_id)) else {
                continue;
            };
            if quad.len() != 4 {
                return Err(MarktrackError::detection(format!(
                    "marker {id} has {} corners",
                    quad.len()
                )));
            }
            let mut points = [Point2::default(); 4];
            for (slot, p) in points.iter_mut().zip(quad.iter()) {
                *slot = Point2::new(f64::from(p.x), f64::from(p.y));
            }
            detections.push(MarkerDetection::new(id, points));
        }
        Ok(detections)
    }
}

fn predefined_type(dictionary: MarkerDictionary) -> PredefinedDictionaryType {
    use DictionaryPopulation::*;
    use MarkerGrid::*;
    use PredefinedDictionaryType as P;
    match (dictionary.grid, dictionary.population) {
        (Grid4x4, P50) => P::DICT_4X4_50,
        (Grid4x4, P100) => P::DICT_4X4_100,
        (Grid4x4, P250) => P::DICT_4X4_250,
        (Grid4x4, P1000) => P::DICT_4X4_1000,
        (Grid5x5, P50) => P::DICT_5X5_50,
        (Grid5x5, P100) => P::DICT_5X5_100,
        (Grid5x5, P250) => P::DICT_5X5_250,
        (Grid5x5, P1000) => P::DICT_5X5_1000,
        (Grid6x6, P50) => P::DICT_6X6_50,
        (Grid6x6, P100) => P::DICT_6X6_100,
        (Grid6x6, P250) => P::DICT_6X6_250,
        (Grid6x6, P1000) => P::DICT_6X6_1000,
        (Grid7x7, P50) => P::DICT_7X7_50,
        (Grid7x7, P100) => P::DICT_7X7_100,
        (Grid7x7, P250) => P::DICT_7X7_250,
        (Grid7x7, P1000) => P::DICT_7X7_1000,
    }
}
