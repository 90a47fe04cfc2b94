//! Typed client stub for the recipe search service.
//!
//! One descriptor static and one blocking/non-blocking method pair per
//! remote operation, each delegating to the shared invoker. All state
//! lives in the invoker; stubs are side-effect-free wrappers and any
//! number of them may share one channel.

use hail_core::{
    CallInvoker, CallOptions, MethodDescriptor, MethodInfo, MethodKind, RpcError,
    ServiceDescriptor, UnaryCall,
};

use crate::messages::{
    AddRecipesRequest, AddRecipesResponse, HealthRequest, HealthResponse, RecipeRequest,
    RecipeResponse, ResetDataRequest, ResetDataResponse, SearchRecipesByIngredientsRequest,
    SearchRecipesByIngredientsResponse,
};

/// The service's fixed name, exactly as exposed on the wire.
pub const SERVICE_NAME: &str = "RecipeSearchService";

pub static METHOD_GET_HEALTH: MethodDescriptor<HealthRequest, HealthResponse> =
    MethodDescriptor::unary(SERVICE_NAME, "GetHealth");

pub static METHOD_SEARCH_RECIPES_BY_INGREDIENTS: MethodDescriptor<
    SearchRecipesByIngredientsRequest,
    SearchRecipesByIngredientsResponse,
> = MethodDescriptor::unary(SERVICE_NAME, "SearchRecipesByIngredients");

pub static METHOD_GET_RECIPE: MethodDescriptor<RecipeRequest, RecipeResponse> =
    MethodDescriptor::unary(SERVICE_NAME, "GetRecipe");

pub static METHOD_ADD_RECIPES: MethodDescriptor<AddRecipesRequest, AddRecipesResponse> =
    MethodDescriptor::unary(SERVICE_NAME, "AddRecipes");

pub static METHOD_RESET_DATA: MethodDescriptor<ResetDataRequest, ResetDataResponse> =
    MethodDescriptor::unary(SERVICE_NAME, "ResetData");

/// Service descriptor, for reflection/introspection only.
pub static SERVICE: ServiceDescriptor = ServiceDescriptor::new(
    SERVICE_NAME,
    &[
        MethodInfo {
            name: "GetHealth",
            kind: MethodKind::Unary,
        },
        MethodInfo {
            name: "SearchRecipesByIngredients",
            kind: MethodKind::Unary,
        },
        MethodInfo {
            name: "GetRecipe",
            kind: MethodKind::Unary,
        },
        MethodInfo {
            name: "AddRecipes",
            kind: MethodKind::Unary,
        },
        MethodInfo {
            name: "ResetData",
            kind: MethodKind::Unary,
        },
    ],
);

/// Client for the recipe search service.
#[derive(Clone, Debug)]
pub struct RecipeSearchClient<C> {
    invoker: C,
}

impl<C: CallInvoker> RecipeSearchClient<C> {
    /// Create a client over any invoker: a live channel, or a test double.
    pub fn new(invoker: C) -> Self {
        RecipeSearchClient { invoker }
    }

    /// The invoker this client delegates to.
    pub fn invoker(&self) -> &C {
        &self.invoker
    }

    /// Check service health.
    pub fn get_health(
        &self,
        request: &HealthRequest,
        options: CallOptions,
    ) -> UnaryCall<HealthResponse> {
        self.invoker.unary(&METHOD_GET_HEALTH, None, options, request)
    }

    /// Check service health, blocking the calling thread.
    pub fn get_health_blocking(
        &self,
        request: &HealthRequest,
        options: CallOptions,
    ) -> Result<HealthResponse, RpcError> {
        self.invoker
            .unary_blocking(&METHOD_GET_HEALTH, None, options, request)
    }

    /// Search recipes by ingredients.
    pub fn search_recipes_by_ingredients(
        &self,
        request: &SearchRecipesByIngredientsRequest,
        options: CallOptions,
    ) -> UnaryCall<SearchRecipesByIngredientsResponse> {
        self.invoker
            .unary(&METHOD_SEARCH_RECIPES_BY_INGREDIENTS, None, options, request)
    }

    /// Search recipes by ingredients, blocking the calling thread.
    pub fn search_recipes_by_ingredients_blocking(
        &self,
        request: &SearchRecipesByIngredientsRequest,
        options: CallOptions,
    ) -> Result<SearchRecipesByIngredientsResponse, RpcError> {
        self.invoker
            .unary_blocking(&METHOD_SEARCH_RECIPES_BY_INGREDIENTS, None, options, request)
    }

    /// Fetch one recipe by id.
    pub fn get_recipe(
        &self,
        request: &RecipeRequest,
        options: CallOptions,
    ) -> UnaryCall<RecipeResponse> {
        self.invoker.unary(&METHOD_GET_RECIPE, None, options, request)
    }

    /// Fetch one recipe by id, blocking the calling thread.
    pub fn get_recipe_blocking(
        &self,
        request: &RecipeRequest,
        options: CallOptions,
    ) -> Result<RecipeResponse, RpcError> {
        self.invoker
            .unary_blocking(&METHOD_GET_RECIPE, None, options, request)
    }

    /// Add recipes to the index.
    pub fn add_recipes(
        &self,
        request: &AddRecipesRequest,
        options: CallOptions,
    ) -> UnaryCall<AddRecipesResponse> {
        self.invoker.unary(&METHOD_ADD_RECIPES, None, options, request)
    }

    /// Add recipes to the index, blocking the calling thread.
    pub fn add_recipes_blocking(
        &self,
        request: &AddRecipesRequest,
        options: CallOptions,
    ) -> Result<AddRecipesResponse, RpcError> {
        self.invoker
            .unary_blocking(&METHOD_ADD_RECIPES, None, options, request)
    }

    /// Reset all indexed data.
    pub fn reset_data(
        &self,
        request: &ResetDataRequest,
        options: CallOptions,
    ) -> UnaryCall<ResetDataResponse> {
        self.invoker.unary(&METHOD_RESET_DATA, None, options, request)
    }

    /// Reset all indexed data, blocking the calling thread.
    pub fn reset_data_blocking(
        &self,
        request: &ResetDataRequest,
        options: CallOptions,
    ) -> Result<ResetDataResponse, RpcError> {
        self.invoker
            .unary_blocking(&METHOD_RESET_DATA, None, options, request)
    }
}

#[cfg(test)]
mod tests {
    use hail_core::ErrorCode;
    use hail_testkit::{MockInvoker, NullInvoker};

    use super::*;
    use crate::messages::{HealthStatus, SearchRecipesByIngredientsRecipe};

    #[test]
    fn descriptors_use_the_declared_wire_names() {
        assert_eq!(METHOD_GET_HEALTH.full_name(), "RecipeSearchService/GetHealth");
        assert_eq!(
            METHOD_SEARCH_RECIPES_BY_INGREDIENTS.full_name(),
            "RecipeSearchService/SearchRecipesByIngredients"
        );
        assert_eq!(METHOD_GET_RECIPE.full_name(), "RecipeSearchService/GetRecipe");
        assert_eq!(METHOD_ADD_RECIPES.full_name(), "RecipeSearchService/AddRecipes");
        assert_eq!(METHOD_RESET_DATA.full_name(), "RecipeSearchService/ResetData");
    }

    #[test]
    fn service_descriptor_lists_every_operation() {
        assert_eq!(SERVICE.name(), SERVICE_NAME);
        assert_eq!(SERVICE.methods().len(), 5);
        assert_eq!(SERVICE.find("GetHealth").unwrap().kind, MethodKind::Unary);
        assert!(SERVICE.find("ChatByRecipeStream").is_none());
    }

    #[tokio::test]
    async fn stub_delegates_with_the_right_descriptor() {
        let invoker = MockInvoker::new();
        invoker.enqueue_message(
            &METHOD_GET_HEALTH.full_name(),
            &HealthResponse {
                status: HealthStatus::Healthy,
                checks: Vec::new(),
            },
        );
        invoker.enqueue_message(
            &METHOD_SEARCH_RECIPES_BY_INGREDIENTS.full_name(),
            &SearchRecipesByIngredientsResponse {
                recipes: vec![SearchRecipesByIngredientsRecipe {
                    id: 1,
                    name: "Recipe 1".into(),
                    score: 0.5,
                }],
            },
        );

        let client = RecipeSearchClient::new(invoker.clone());

        let health = client
            .get_health(&HealthRequest, CallOptions::new())
            .await
            .unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);

        let found = client
            .search_recipes_by_ingredients(
                &SearchRecipesByIngredientsRequest {
                    username: "test_username".into(),
                    ingredients: vec!["apple".into(), "banana".into()],
                    limit: 3,
                },
                CallOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(found.recipes.len(), 1);

        let calls = invoker.take_calls();
        let methods: Vec<&str> = calls.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(
            methods,
            [
                "RecipeSearchService/GetHealth",
                "RecipeSearchService/SearchRecipesByIngredients",
            ]
        );
        // The stub never sets a host override of its own.
        assert!(calls.iter().all(|c| c.host.is_none()));
    }

    #[test]
    fn blocking_form_returns_the_same_decoded_value() {
        let invoker = MockInvoker::new();
        let expected = HealthResponse {
            status: HealthStatus::Degraded,
            checks: Vec::new(),
        };
        invoker.enqueue_message(&METHOD_GET_HEALTH.full_name(), &expected);

        let client = RecipeSearchClient::new(invoker);
        let health = client
            .get_health_blocking(&HealthRequest, CallOptions::new())
            .unwrap();
        assert_eq!(health, expected);
    }

    #[tokio::test]
    async fn stub_over_a_null_invoker_is_constructible() {
        let client = RecipeSearchClient::new(NullInvoker);
        let err = client
            .get_health(&HealthRequest, CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FailedPrecondition);
    }
}
