//! The typed client over a real channel and in-process peer.

use hail_core::{CallOptions, Channel, ErrorCode, Metadata, RpcError};
use hail_recipe_search::{
    HealthRequest, HealthResponse, HealthStatus, RecipeRequest, RecipeSearchClient,
    SearchRecipesByIngredientsRecipe, SearchRecipesByIngredientsRequest,
    SearchRecipesByIngredientsResponse,
};
use hail_testkit::{decode_message, encode_message, init_tracing, spawn_peer, PeerReply};
use hail_transport_mem::InProcTransport;

/// A peer that serves the two core operations and rejects the rest.
fn recipe_peer(transport: InProcTransport) {
    spawn_peer(transport, |desc, payload| match desc.method.as_str() {
        "RecipeSearchService/GetHealth" => {
            if decode_message::<HealthRequest>(&payload).is_err() {
                return PeerReply::Status(
                    ErrorCode::InvalidArgument,
                    "bad health request".into(),
                    Metadata::new(),
                );
            }
            PeerReply::Payload(encode_message(&HealthResponse {
                status: HealthStatus::Healthy,
                checks: Vec::new(),
            }))
        }
        "RecipeSearchService/SearchRecipesByIngredients" => {
            match decode_message::<SearchRecipesByIngredientsRequest>(&payload) {
                Ok(request) => PeerReply::Payload(encode_message(
                    &SearchRecipesByIngredientsResponse {
                        recipes: request
                            .ingredients
                            .iter()
                            .take(request.limit as usize)
                            .enumerate()
                            .map(|(i, ingredient)| SearchRecipesByIngredientsRecipe {
                                id: i as u64 + 1,
                                name: format!("Recipe with {ingredient}"),
                                score: 1.0 / (i + 1) as f32,
                            })
                            .collect(),
                    },
                )),
                Err(e) => PeerReply::Status(
                    ErrorCode::InvalidArgument,
                    e.to_string(),
                    Metadata::new(),
                ),
            }
        }
        _ => PeerReply::Status(
            ErrorCode::Unimplemented,
            format!("{} is not served here", desc.method),
            Metadata::new(),
        ),
    });
}

#[tokio::test]
async fn health_and_search_over_a_channel() {
    init_tracing();
    let (client_transport, server_transport) = InProcTransport::pair();
    recipe_peer(server_transport);
    let client = RecipeSearchClient::new(Channel::new(client_transport));

    let health = client
        .get_health(&HealthRequest, CallOptions::new())
        .await
        .unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);

    let found = client
        .search_recipes_by_ingredients(
            &SearchRecipesByIngredientsRequest {
                username: "test_username".into(),
                ingredients: vec!["apple".into(), "banana".into(), "cherry".into()],
                limit: 2,
            },
            CallOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(found.recipes.len(), 2);
    assert_eq!(found.recipes[0].name, "Recipe with apple");
}

#[tokio::test]
async fn unserved_operation_surfaces_the_remote_status() {
    init_tracing();
    let (client_transport, server_transport) = InProcTransport::pair();
    recipe_peer(server_transport);
    let client = RecipeSearchClient::new(Channel::new(client_transport));

    let err = client
        .get_recipe(&RecipeRequest { id: 1 }, CallOptions::new())
        .await
        .unwrap_err();
    match err {
        RpcError::Status { code, message, .. } => {
            assert_eq!(code, ErrorCode::Unimplemented);
            assert!(message.contains("GetRecipe"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn buffered_health_payload_survives_a_chunking_transport() {
    init_tracing();
    let (client_transport, server_transport) = InProcTransport::pair_chunked(4);
    recipe_peer(server_transport);
    let client = RecipeSearchClient::new(Channel::new(client_transport));

    let health = client
        .get_health(&HealthRequest, CallOptions::new())
        .await
        .unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
}
