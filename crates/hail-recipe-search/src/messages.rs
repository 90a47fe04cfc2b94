//! Message types for the recipe search service.
//!
//! The invocation layer treats these as opaque serializable values. The
//! health types carry a hand-rolled length-prefixed encoding and take the
//! buffered wire path; the remaining types go through bincode on the
//! contiguous path.

use bytes::{Buf, BufMut, BytesMut};
use hail_core::{Codec, DecodeError, EncodeError, Message, PayloadChunks};
use serde::{Deserialize, Serialize};

/// Implement [`Message`] over bincode for serde types.
macro_rules! bincode_message {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Message for $ty {
                fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
                    bincode::serialize(self).map_err(|e| EncodeError::Message(e.to_string()))
                }
                fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
                    bincode::deserialize(bytes).map_err(|e| DecodeError::Invalid(e.to_string()))
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// GetHealth
// ---------------------------------------------------------------------------

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy = 0,
    Degraded = 1,
    Unhealthy = 2,
}

impl HealthStatus {
    fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(HealthStatus::Healthy),
            1 => Ok(HealthStatus::Degraded),
            2 => Ok(HealthStatus::Unhealthy),
            other => Err(DecodeError::Invalid(format!("unknown health status {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheck>,
}

impl Message for HealthRequest {
    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(Vec::new())
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            Ok(HealthRequest)
        } else {
            Err(DecodeError::Invalid("expected empty payload".into()))
        }
    }

    fn capability() -> Codec {
        Codec::Buffered
    }

    fn encoded_len(&self) -> Result<usize, EncodeError> {
        Ok(0)
    }

    fn encode_into(&self, _buf: &mut BytesMut) -> Result<(), EncodeError> {
        Ok(())
    }

    fn decode_chunks(payload: &PayloadChunks) -> Result<Self, DecodeError> {
        if payload.is_empty() {
            Ok(HealthRequest)
        } else {
            Err(DecodeError::Invalid("expected empty payload".into()))
        }
    }
}

impl HealthResponse {
    fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.status as u8);
        buf.put_u32_le(self.checks.len() as u32);
        for check in &self.checks {
            write_str(buf, &check.name);
            buf.put_u8(check.status as u8);
            write_str(buf, &check.message);
        }
    }

    fn read_from(buf: &mut impl Buf) -> Result<Self, DecodeError> {
        if buf.remaining() < 5 {
            return Err(DecodeError::Truncated);
        }
        let status = HealthStatus::from_u8(buf.get_u8())?;
        let count = buf.get_u32_le() as usize;
        let mut checks = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let name = read_str(buf)?;
            if !buf.has_remaining() {
                return Err(DecodeError::Truncated);
            }
            let status = HealthStatus::from_u8(buf.get_u8())?;
            let message = read_str(buf)?;
            checks.push(HealthCheck {
                name,
                status,
                message,
            });
        }
        if buf.has_remaining() {
            return Err(DecodeError::Invalid("trailing bytes".into()));
        }
        Ok(HealthResponse { status, checks })
    }
}

impl Message for HealthResponse {
    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        Ok(buf)
    }

    fn decode(mut bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::read_from(&mut bytes)
    }

    fn capability() -> Codec {
        Codec::Buffered
    }

    fn encoded_len(&self) -> Result<usize, EncodeError> {
        let mut len = 1 + 4;
        for check in &self.checks {
            len += 4 + check.name.len() + 1 + 4 + check.message.len();
        }
        Ok(len)
    }

    fn encode_into(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        self.write_to(buf);
        Ok(())
    }

    fn decode_chunks(payload: &PayloadChunks) -> Result<Self, DecodeError> {
        Self::read_from(&mut payload.reader())
    }
}

fn write_str(buf: &mut impl BufMut, s: &str) {
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn read_str(buf: &mut impl Buf) -> Result<String, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::Truncated);
    }
    let len = buf.get_u32_le() as usize;
    if buf.remaining() < len {
        return Err(DecodeError::Truncated);
    }
    let mut bytes = vec![0; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|e| DecodeError::Invalid(e.to_string()))
}

// ---------------------------------------------------------------------------
// SearchRecipesByIngredients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecipesByIngredientsRequest {
    pub username: String,
    pub ingredients: Vec<String>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecipesByIngredientsRecipe {
    pub id: u64,
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecipesByIngredientsResponse {
    pub recipes: Vec<SearchRecipesByIngredientsRecipe>,
}

// ---------------------------------------------------------------------------
// GetRecipe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u64,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub recipe: Option<Recipe>,
}

// ---------------------------------------------------------------------------
// AddRecipes / ResetData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRecipesRequest {
    pub recipes: Vec<NewRecipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRecipesResponse {
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetDataRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetDataResponse;

bincode_message!(
    SearchRecipesByIngredientsRequest,
    SearchRecipesByIngredientsResponse,
    RecipeRequest,
    RecipeResponse,
    AddRecipesRequest,
    AddRecipesResponse,
    ResetDataRequest,
    ResetDataResponse,
);
