//! Built-in decoder for `KHR_draco_mesh_compression`.

use draco_decoder::{AttributeDataType, MeshDecodeConfig, decode_mesh};
use glam::Vec3;

use crate::compression::{
    ComponentType, CompressedPrimitive, DecodedGeometry, GeometryDecoder,
    KHR_DRACO_MESH_COMPRESSION,
};
use crate::error::{DecodeError, DecodeResult};

/// Native Draco decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DracoDecoder;

fn data_type(component_type: ComponentType) -> AttributeDataType {
    match component_type {
        ComponentType::I8 => AttributeDataType::Int8,
        ComponentType::U8 => AttributeDataType::UInt8,
        ComponentType::I16 => AttributeDataType::Int16,
        ComponentType::U16 => AttributeDataType::UInt16,
        ComponentType::U32 => AttributeDataType::UInt32,
        ComponentType::F32 => AttributeDataType::Float32,
    }
}

fn invalid(detail: impl Into<String>) -> DecodeError {
    DecodeError::InvalidFormat {
        context: KHR_DRACO_MESH_COMPRESSION,
        detail: detail.into(),
    }
}

fn to_u32(value: usize, what: &str) -> DecodeResult<u32> {
    u32::try_from(value).map_err(|_| invalid(format!("{what} {value} exceeds u32")))
}

impl GeometryDecoder for DracoDecoder {
    fn extension(&self) -> &str {
        KHR_DRACO_MESH_COMPRESSION
    }

    fn decode(
        &self,
        payload: &[u8],
        primitive: &CompressedPrimitive,
    ) -> DecodeResult<DecodedGeometry> {
        let vertex_count = primitive.vertex_count;
        let index_count = primitive.index_count;

        let mut config = MeshDecodeConfig::new(
            to_u32(vertex_count, "vertex count")?,
            to_u32(index_count, "index count")?,
        );
        for attribute in &primitive.attributes {
            config.add_attribute(
                to_u32(attribute.components, "component count")?,
                data_type(attribute.component_type),
            );
        }

        let decoded = pollster::block_on(decode_mesh(payload, &config))
            .ok_or_else(|| invalid("decoder rejected payload"))?;

        // Output layout: indices, then each attribute in id order.
        let wide = index_count > usize::from(u16::MAX);
        let index_bytes = index_count * if wide { 4 } else { 2 };
        let index_slice = decoded
            .get(..index_bytes)
            .ok_or_else(|| invalid("decoded stream too short for indices"))?;
        let indices: Vec<u32> = if wide {
            index_slice
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        } else {
            index_slice
                .chunks_exact(2)
                .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
                .collect()
        };

        let mut offset = index_bytes;
        let mut positions = None;
        for attribute in &primitive.attributes {
            let len = attribute.components * vertex_count * attribute.component_type.size_in_bytes();
            let bytes = decoded
                .get(offset..offset + len)
                .ok_or_else(|| invalid(format!("decoded stream too short for {}", attribute.semantic)))?;
            offset += len;

            if attribute.semantic == "POSITION" {
                if attribute.component_type != ComponentType::F32 || attribute.components != 3 {
                    return Err(invalid("POSITION must be three floats"));
                }
                positions = Some(
                    bytes
                        .chunks_exact(12)
                        .map(|c| {
                            let f = |i: usize| f32::from_le_bytes([c[i], c[i + 1], c[i + 2], c[i + 3]]);
                            Vec3::new(f(0), f(4), f(8))
                        })
                        .collect::<Vec<_>>(),
                );
            }
        }

        let positions = positions.ok_or_else(|| invalid("POSITION attribute missing"))?;
        tracing::debug!(
            vertices = positions.len(),
            indices = indices.len(),
            "decoded draco primitive"
        );
        Ok(DecodedGeometry { positions, indices })
    }
}
