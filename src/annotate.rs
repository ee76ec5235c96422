// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! BODY_25 skeleton rendering for engines that draw in software.

use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use ndarray::Array3;

use crate::error::Result;
use crate::joints::{BODY_25_PAIRS, NUM_BODY_JOINTS};
use crate::results::PoseKeypoints;
use crate::utils::{array_to_image, image_to_array};

/// Joints at or below this confidence are not drawn.
const RENDER_THRESHOLD: f32 = 0.05;

/// Joint marker radius in pixels.
const JOINT_RADIUS: i32 = 4;

/// Pose color palette, cycled per limb.
pub const POSE_COLORS: [[u8; 3]; 20] = [
    [255, 128, 0],   // #ff8000
    [255, 153, 51],  // #ff9933
    [255, 178, 102], // #ffb266
    [230, 230, 0],   // #e6e600
    [255, 153, 255], // #ff99ff
    [153, 204, 255], // #99ccff
    [255, 102, 255], // #ff66ff
    [255, 51, 255],  // #ff33ff
    [102, 178, 255], // #66b2ff
    [51, 153, 255],  // #3399ff
    [255, 153, 153], // #ff9999
    [255, 102, 102], // #ff6666
    [255, 51, 51],   // #ff3333
    [153, 255, 153], // #99ff99
    [102, 255, 102], // #66ff66
    [51, 255, 51],   // #33ff33
    [0, 255, 0],     // #00ff00
    [0, 0, 255],     // #0000ff
    [255, 0, 0],     // #ff0000
    [255, 255, 255], // #ffffff
];

/// Color for limb `index`.
#[must_use]
pub fn limb_color(index: usize) -> Rgb<u8> {
    Rgb(POSE_COLORS[index % POSE_COLORS.len()])
}

/// Draw every person's skeleton onto a copy of `frame`.
///
/// # Errors
///
/// Returns an error if `frame` is not a 3-channel HWC buffer.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_skeletons(frame: &Array3<u8>, keypoints: &PoseKeypoints) -> Result<Array3<u8>> {
    let mut img = array_to_image(frame)?;

    for person in keypoints.data.outer_iter() {
        let visible = |j: usize| person[[j, 2]] > RENDER_THRESHOLD;

        for (i, [a, b]) in BODY_25_PAIRS.iter().copied().enumerate() {
            if visible(a) && visible(b) {
                draw_line_segment_mut(
                    &mut img,
                    (person[[a, 0]], person[[a, 1]]),
                    (person[[b, 0]], person[[b, 1]]),
                    limb_color(i),
                );
            }
        }

        for j in (0..NUM_BODY_JOINTS).filter(|&j| visible(j)) {
            let center = (person[[j, 0]].round() as i32, person[[j, 1]].round() as i32);
            draw_filled_circle_mut(&mut img, center, JOINT_RADIUS, limb_color(j));
        }
    }

    image_to_array(img)
}
