// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod builder;
pub mod candidate;
pub mod engine;
pub mod submission;
pub mod target;
pub mod worker;
