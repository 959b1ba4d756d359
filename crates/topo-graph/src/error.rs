// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for topology loading and graph construction.

/// Errors that can occur when loading or building a topology graph.
#[derive(Debug, thiserror::Error)]
pub enum TopoError {
    /// The topology file could not be read.
    #[error("failed to read topology: {0}")]
    Io(#[from] std::io::Error),

    /// An edge references a node that is not declared on the node line.
    #[error("format error at line {line}: {detail}")]
    Format { line: usize, detail: String },

    /// An edge line does not contain exactly two tokens.
    #[error("malformed edge at line {line}: expected 2 tokens, found {found}")]
    MalformedLine { line: usize, found: usize },

    /// An edge connects a node to itself.
    #[error("self-loop on node '{node}' at line {line}")]
    SelfLoop { line: usize, node: String },

    /// The graph violates a structural invariant (asymmetry, dangling
    /// neighbour, duplicate node).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}
