// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node geometry: sizes, port anchors and grid footprints.

pub mod node;

pub use node::{DefaultNodeVisual, NodeStyle, NodeVisual, PORT_MARKER_INPUT, PORT_MARKER_OUTPUT};
