mod normalize;
mod router;
mod triage;
