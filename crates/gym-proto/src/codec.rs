//! Byte-level encoding of plans and statistics.
//!
//! Every file starts with an 8-byte header: a 4-byte tag naming the kind of
//! message, then [`FORMAT_VERSION`] as little-endian `u32`. The rkyv archive
//! follows. The archive is copied into an aligned buffer before validation,
//! so bytes read straight from a file can be decoded without alignment
//! concerns.

use rkyv::util::AlignedVec;

use crate::error::Error;
use crate::plan::Node;
use crate::stats::Graph;
use crate::FORMAT_VERSION;

/// Tag of a plan file.
pub const PLAN_TAG: [u8; 4] = *b"GYMP";

/// Tag of a statistics file.
pub const STATS_TAG: [u8; 4] = *b"GYMS";

const HEADER_LEN: usize = 8;

fn with_header(tag: [u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&tag);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Check the header and return the archive that follows it, aligned.
fn archive(tag: [u8; 4], bytes: &[u8]) -> Result<AlignedVec, Error> {
    if bytes.len() < HEADER_LEN || bytes[..4] != tag {
        return Err(Error::Deserialization(format!(
            "missing {} header",
            String::from_utf8_lossy(&tag)
        )));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..HEADER_LEN]);
    let actual = u32::from_le_bytes(version);
    if actual != FORMAT_VERSION {
        return Err(Error::VersionMismatch {
            expected: FORMAT_VERSION,
            actual,
        });
    }

    let body = &bytes[HEADER_LEN..];
    let mut buf = AlignedVec::with_capacity(body.len());
    buf.extend_from_slice(body);
    Ok(buf)
}

/// Encode a join tree.
pub fn encode_plan(node: &Node) -> Result<Vec<u8>, Error> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(node)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(with_header(PLAN_TAG, &bytes))
}

/// Decode a join tree and check its structural rules.
pub fn decode_plan(bytes: &[u8]) -> Result<Node, Error> {
    let buf = archive(PLAN_TAG, bytes)?;
    let node = rkyv::from_bytes::<Node, rkyv::rancor::Error>(&buf)
        .map_err(|e| Error::Deserialization(e.to_string()))?;
    node.validate()?;
    Ok(node)
}

/// Encode a statistics graph.
pub fn encode_stats(graph: &Graph) -> Result<Vec<u8>, Error> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(graph)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(with_header(STATS_TAG, &bytes))
}

/// Decode a statistics graph.
pub fn decode_stats(bytes: &[u8]) -> Result<Graph, Error> {
    let buf = archive(STATS_TAG, bytes)?;
    rkyv::from_bytes::<Graph, rkyv::rancor::Error>(&buf)
        .map_err(|e| Error::Deserialization(e.to_string()))
}
