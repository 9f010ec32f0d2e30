// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for images, embeddings and settings files.

pub mod embedding;
pub mod media;
pub mod serialization;
