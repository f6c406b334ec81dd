use pantry_planner::api_connection::{
    connection::{first_content, ApiConnectionError},
    endpoints::{ChatCompletionRequest, ChatMessage, Provider, GATEWAY_MODELS},
};
use pantry_planner::assistant;
use pantry_planner::config::{GatewayConfig, API_KEY_ENV_VAR};
use pantry_planner::model::{Recipe, RecipeIngredient};
use dotenv::dotenv;
use std::env;

fn setup_test_environment() {
    dotenv().ok();
}

fn provider_reading(env_var: &str) -> Provider {
    Provider::openrouter(&GatewayConfig {
        api_key_env_var: env_var.to_string(),
        ..Default::default()
    })
}

fn live_provider(test_name: &str) -> Option<Provider> {
    setup_test_environment();
    if env::var(API_KEY_ENV_VAR).is_err() {
        println!("Skipping {}: {} not set.", test_name, API_KEY_ENV_VAR);
        return None;
    }
    Some(provider_reading(API_KEY_ENV_VAR))
}

fn pancake_recipe() -> Recipe {
    Recipe {
        id: "pancakes".to_string(),
        title: "Pancakes".to_string(),
        servings: 4,
        ingredients: vec![
            RecipeIngredient { name: "plain flour".to_string(), quantity: 100.0, unit: "g".to_string() },
            RecipeIngredient { name: "eggs".to_string(), quantity: 2.0, unit: String::new() },
            RecipeIngredient { name: "milk".to_string(), quantity: 300.0, unit: "ml".to_string() },
        ],
        steps: vec!["Whisk everything into a batter.".to_string(), "Fry ladlefuls in a hot pan.".to_string()],
        macros_per_serving: None,
        tags: Vec::new(),
    }
}

#[tokio::test]
async fn test_missing_api_key_error() {
    setup_test_environment();
    let provider = provider_reading("THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ");
    let request = ChatCompletionRequest {
        model: GATEWAY_MODELS[0].model_name.to_string(),
        messages: vec![ChatMessage::user("Hello")],
        response_format: None,
        temperature: None,
        max_tokens: None,
    };
    let result = provider.call_chat_completion(request).await;
    assert!(matches!(result, Err(ApiConnectionError::MissingApiKey(_))));
    if let Err(ApiConnectionError::MissingApiKey(key_name)) = result {
        assert_eq!(key_name, "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ");
    }
}

#[tokio::test]
async fn test_missing_api_key_reaches_assistant_callers() {
    let provider = provider_reading("ANOTHER_KEY_THAT_SHOULD_NOT_EXIST_QWERTY");
    let error = assistant::estimate_nutrients(&provider, &pancake_recipe()).await.unwrap_err();
    assert!(matches!(error, ApiConnectionError::MissingApiKey(_)));
    assert!(!error.user_message().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_successful_plain_call() {
    let Some(provider) = live_provider("test_successful_plain_call") else {
        return;
    };
    let request = ChatCompletionRequest {
        model: provider.default_model().to_string(),
        messages: vec![ChatMessage::user("What is the capital of France? Respond concisely.")],
        response_format: None,
        temperature: Some(0.7),
        max_tokens: Some(100),
    };

    let result = provider.call_chat_completion(request).await;
    assert!(result.is_ok(), "API call failed: {:?}", result.err());
    let content = first_content(&result.unwrap()).unwrap();
    assert!(content.to_lowercase().contains("paris"));
}

#[tokio::test]
#[ignore]
async fn test_live_parse_recipe() {
    let Some(provider) = live_provider("test_live_parse_recipe") else {
        return;
    };
    let text = "Tomato Soup (serves 2)\n- 400 g chopped tomatoes\n- 1 onion\n- 500 ml vegetable stock\nSoften the onion, add the rest, simmer 20 minutes and blend.";

    let result = assistant::parse_recipe(&provider, text).await;
    assert!(result.is_ok(), "Parsing failed: {:?}", result.err());
    let recipe = result.unwrap();
    assert!(recipe.title.to_lowercase().contains("soup"));
    assert!(recipe.ingredients.len() >= 3);
    assert!(!recipe.steps.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_live_estimate_nutrients() {
    let Some(provider) = live_provider("test_live_estimate_nutrients") else {
        return;
    };
    let result = assistant::estimate_nutrients(&provider, &pancake_recipe()).await;
    assert!(result.is_ok(), "Estimation failed: {:?}", result.err());
    let macros = result.unwrap();
    assert!(macros.kcal > 50.0 && macros.kcal < 1500.0, "implausible kcal {}", macros.kcal);
}

#[tokio::test]
#[ignore]
async fn test_api_error_with_invalid_key() {
    setup_test_environment();

    const INVALID_KEY_ENV_NAME_FOR_THIS_TEST: &str = "ENV_VAR_WITH_BAD_KEY_VALUE";
    unsafe {
        std::env::set_var(INVALID_KEY_ENV_NAME_FOR_THIS_TEST, "this_is_a_deliberately_bad_api_key_string_for_testing");
    }

    let provider = provider_reading(INVALID_KEY_ENV_NAME_FOR_THIS_TEST);
    let request = provider.json_request("Reply with {}".to_string(), "Hello".to_string());
    let result = provider.call_chat_completion(request).await;

    match result {
        Err(ApiConnectionError::ApiError { status, .. }) => {
            assert_eq!(status.as_u16(), 401);
        }
        other => panic!("Expected ApiError for an invalid key, got {:?}", other),
    }

    unsafe {
        std::env::remove_var(INVALID_KEY_ENV_NAME_FOR_THIS_TEST);
    }
}
