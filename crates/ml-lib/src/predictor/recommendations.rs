//! Rule-based review advice for a pull request

use crate::models::{FactorImpact, RiskFeatures};

/// Risk score above which a PR with no specific findings still gets a warning
const HIGH_RISK: f64 = 0.7;

/// Build the advice list for a scored PR.
///
/// Each rule fires independently and in a fixed order. The result is never
/// empty: a generic high-risk warning or an all-clear message stands in
/// when no rule fires. `_top_factors` is accepted so callers can pass the
/// explanation along; the rules only look at raw features and the score.
pub fn generate(
    features: &RiskFeatures,
    risk_score: f64,
    _top_factors: &[FactorImpact],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    // f1 is log(1 + lines changed)
    let approx_lines = (features.f1.exp() - 1.0).trunc();

    let rules: [(bool, &str); 8] = [
        (
            approx_lines > 1500.0,
            "Consider splitting this PR into smaller modules to reduce review complexity.",
        ),
        (
            features.f2 > 10.0,
            "This PR modifies multiple files - consider modular refactoring or breaking into smaller PRs.",
        ),
        (
            features.f7 < 0.3,
            "Assign a senior reviewer due to low contributor experience.",
        ),
        (
            features.f8 > 0.6,
            "High file churn detected - consider refactoring before merge to reduce technical debt.",
        ),
        (
            features.f5 > 0.5,
            "This PR has slow merge time - prioritize review or break into smaller parts.",
        ),
        (
            features.f6 > 0.3,
            "Contributor has high rejection rate - ensure thorough testing before submission.",
        ),
        (
            features.f3 > 5.0,
            "Multiple commits suggest iterations - consider squash merging for cleaner history.",
        ),
        (
            features.f4 == 0.0 && risk_score > 0.5,
            "No review comments detected - request additional review or clarification.",
        ),
    ];

    recommendations.extend(
        rules
            .iter()
            .filter(|(fired, _)| *fired)
            .map(|(_, text)| text.to_string()),
    );

    if recommendations.is_empty() && risk_score > HIGH_RISK {
        recommendations.push(
            "This PR has high overall risk - consider additional testing and review cycles."
                .to_string(),
        );
    }

    if recommendations.is_empty() {
        recommendations.push("PR looks good - proceed with standard review process.".to_string());
    }

    recommendations
}
