// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Prompt-to-mask pipeline: tensor building, model invocation and mask decoding.

pub mod mask;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod predictor;
pub mod tensors;
pub mod worker;
