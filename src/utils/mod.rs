// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vector math and color helpers

pub mod color;
pub mod math;

pub use color::{values_to_rgb, Colormap, Hsv, Rgb};
pub use math::{dot_by_row, magnitude_by_row, normalize};
