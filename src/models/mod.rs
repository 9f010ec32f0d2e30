// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: prompts and shared application state.

pub mod prompt;
pub mod state;
