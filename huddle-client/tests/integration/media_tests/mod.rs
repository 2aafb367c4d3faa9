mod test_transforms;
