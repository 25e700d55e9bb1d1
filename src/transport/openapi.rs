//! OpenAPI description of the HTTP surface, served at `GET /api-docs`.

use serde_json::{Value, json};

/// Builds the OpenAPI 3.0 document.
#[must_use]
pub fn document() -> Value {
    let error_body = json!({
        "type": "object",
        "properties": { "error": { "type": "string" } }
    });
    let scenario_config = json!({
        "type": "object",
        "additionalProperties": {
            "type": "object",
            "additionalProperties": { "type": "boolean" }
        },
        "example": {
            "get.api-users": { "success": true, "error": false },
            "post.api-auth-login": { "success": true, "invalid_credentials": false }
        }
    });
    let endpoint_index = json!({
        "type": "object",
        "additionalProperties": {
            "type": "object",
            "properties": {
                "activeUseCase": { "type": "string", "nullable": true },
                "useCases": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "integer" },
                            "response": {},
                            "headers": {
                                "type": "object",
                                "additionalProperties": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }
    });

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "mockstage",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Replays recorded fixtures for any request, selected by the active scenario of its canonical key."
        },
        "tags": [
            { "name": "Config", "description": "Select which scenario is active per key" },
            { "name": "Endpoints", "description": "List recorded fixtures" },
            { "name": "Mock", "description": "Any other route is answered from fixtures" }
        ],
        "paths": {
            "/config": {
                "get": {
                    "tags": ["Config"],
                    "summary": "Current scenario config",
                    "responses": {
                        "200": { "description": "The stored config",
                                 "content": { "application/json": { "schema": scenario_config } } }
                    }
                },
                "post": {
                    "tags": ["Config"],
                    "summary": "Replace the scenario config",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": scenario_config } }
                    },
                    "responses": {
                        "200": {
                            "description": "Config replaced",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": {
                                    "success": { "type": "boolean" },
                                    "message": { "type": "string" },
                                    "config": { "type": "object" }
                                }
                            } } }
                        },
                        "400": { "description": "Body is not a JSON object",
                                 "content": { "application/json": { "schema": error_body } } },
                        "500": { "description": "Config could not be written",
                                 "content": { "application/json": { "schema": error_body } } }
                    }
                }
            },
            "/endpoints": {
                "get": {
                    "tags": ["Endpoints"],
                    "summary": "All recorded fixtures by key",
                    "responses": {
                        "200": { "description": "Endpoint listing",
                                 "content": { "application/json": { "schema": endpoint_index } } }
                    }
                },
                "post": {
                    "tags": ["Endpoints"],
                    "summary": "Recorded fixtures filtered by key and/or use case",
                    "requestBody": {
                        "required": false,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "properties": {
                                "queryKey": { "type": "string", "example": "get.api-users" },
                                "useCase": { "type": "string", "example": "success" }
                            }
                        } } }
                    },
                    "responses": {
                        "200": { "description": "Filtered endpoint listing",
                                 "content": { "application/json": { "schema": endpoint_index } } },
                        "400": { "description": "Body is not a valid filter",
                                 "content": { "application/json": { "schema": error_body } } }
                    }
                }
            },
            "/{path}": {
                "parameters": [{
                    "in": "path",
                    "name": "path",
                    "required": true,
                    "schema": { "type": "string" },
                    "description": "Any path, e.g. api/users"
                }],
                "get": mock_operation("GET"),
                "post": mock_operation("POST"),
                "put": mock_operation("PUT"),
                "patch": mock_operation("PATCH"),
                "delete": mock_operation("DELETE")
            }
        }
    })
}

fn mock_operation(method: &str) -> Value {
    json!({
        "tags": ["Mock"],
        "summary": format!("Mocked endpoint ({method})"),
        "description": "Answered with the fixture of the active scenario for the request's canonical key.",
        "responses": {
            "200": { "description": "Fixture status, headers and body (status may differ)" },
            "404": {
                "description": "No active scenario, or its fixture file is missing",
                "content": { "application/json": { "schema": {
                    "type": "object",
                    "properties": {
                        "error": { "type": "string" },
                        "queryKey": { "type": "string" },
                        "message": { "type": "string" },
                        "useCase": { "type": "string" },
                        "expectedFile": { "type": "string" }
                    }
                } } }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_management_routes() {
        let doc = document();
        assert_eq!(doc["openapi"], "3.0.0");
        assert!(doc["paths"]["/config"]["post"].is_object());
        assert!(doc["paths"]["/endpoints"]["get"].is_object());
        assert_eq!(doc["paths"]["/{path}"]["delete"]["tags"][0], "Mock");
    }
}
