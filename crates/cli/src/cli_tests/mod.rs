// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// This module contains split test files for CLI parsing tests.
// Each file focuses on a specific category of tests.

use super::*;

mod sync_tests;
